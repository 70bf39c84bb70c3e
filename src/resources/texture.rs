//! Texture handles and their loading state.
//!
//! A texture is requested by path and immediately gets a [`TextureId`]. The
//! image itself arrives later (or never); until then the handle is
//! [`TextureState::Pending`] and whoever samples it falls back to a
//! placeholder.

use std::fmt::Display;

/// Handle to a texture in a [`TextureRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

impl Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextureState {
    Pending,
    Ready { width: u32, height: u32 },
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct TextureSlot {
    pub path: String,
    pub state: TextureState,
}

/// Something that can fetch an image in the background.
///
/// `request` must return right away. Completion is reported out of band,
/// see [`crate::resources::AssetLoader`].
pub trait TextureLoader {
    fn request(&mut self, id: TextureId, path: &str);
}

/// All textures a scene ever asked for, in request order.
#[derive(Clone, Debug, Default)]
pub struct TextureRegistry {
    slots: Vec<TextureSlot>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` as pending and asks `loader` to fetch it.
    ///
    /// Fire-and-forget: the returned handle is usable right away.
    pub fn load(&mut self, loader: &mut dyn TextureLoader, path: &str) -> TextureId {
        let id = TextureId(self.slots.len());
        self.slots.push(TextureSlot {
            path: path.to_string(),
            state: TextureState::Pending,
        });
        log::debug!("requesting {id} from {path}");
        loader.request(id, path);
        id
    }

    /// Records the outcome of a load. Returns `false` for unknown handles and
    /// for handles that were already resolved.
    pub fn resolve(&mut self, id: TextureId, outcome: Result<(u32, u32), String>) -> bool {
        let Some(slot) = self.slots.get_mut(id.0) else {
            log::warn!("{id} is not part of this scene");
            return false;
        };
        if slot.state != TextureState::Pending {
            log::warn!("{id} ({}) was already resolved", slot.path);
            return false;
        }
        slot.state = match outcome {
            Ok((width, height)) => TextureState::Ready { width, height },
            Err(reason) => {
                log::warn!("{id} ({}) could not be loaded: {reason}", slot.path);
                TextureState::Failed(reason)
            }
        };
        true
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureSlot> {
        self.slots.get(id.0)
    }

    pub fn state(&self, id: TextureId) -> Option<&TextureState> {
        self.get(id).map(|slot| &slot.state)
    }

    pub fn is_ready(&self, id: TextureId) -> bool {
        matches!(self.state(id), Some(TextureState::Ready { .. }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &TextureSlot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| (TextureId(idx), slot))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Bind group layout shared by all materials: colour map, sampler and the
/// material uniform.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// Layout for the scene background: just a texture and its sampler.
pub fn background_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("background_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Requests(Vec<(TextureId, String)>);
    impl TextureLoader for Requests {
        fn request(&mut self, id: TextureId, path: &str) {
            self.0.push((id, path.to_string()));
        }
    }

    #[test]
    fn load_hands_out_pending_handles_in_order() {
        let mut registry = TextureRegistry::new();
        let mut loader = Requests::default();
        let a = registry.load(&mut loader, "a.png");
        let b = registry.load(&mut loader, "b.jpg");
        assert_ne!(a, b);
        assert_eq!(registry.state(a), Some(&TextureState::Pending));
        assert_eq!(
            loader.0,
            vec![(a, "a.png".to_string()), (b, "b.jpg".to_string())]
        );
    }

    #[test]
    fn a_handle_resolves_once() {
        let mut registry = TextureRegistry::new();
        let id = registry.load(&mut Requests::default(), "a.png");
        assert!(registry.resolve(id, Ok((4, 2))));
        assert!(registry.is_ready(id));
        assert!(!registry.resolve(id, Err("late failure".into())));
        assert_eq!(
            registry.state(id),
            Some(&TextureState::Ready {
                width: 4,
                height: 2
            })
        );
    }

    #[test]
    fn failures_are_kept_with_their_reason() {
        let mut registry = TextureRegistry::new();
        let id = registry.load(&mut Requests::default(), "missing.png");
        assert!(registry.resolve(id, Err("not found".into())));
        assert!(!registry.is_ready(id));
        assert_eq!(
            registry.state(id),
            Some(&TextureState::Failed("not found".into()))
        );
        assert!(!registry.resolve(TextureId(42), Ok((1, 1))));
    }
}
