use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::SceneConfig,
    data_structures::texture,
    pipelines::{
        background::BackgroundResources,
        basic::{mk_line_pipeline, mk_mesh_pipeline, mk_scene_layout},
        light::{LightResources, LightUniform},
    },
    resources::texture::material_layout,
};

/// Size of the surface and depth buffer for a window of `width`×`height`
/// physical pixels. Each side is kept within `1..=max`, the device's largest
/// 2D texture.
pub fn surface_size(width: u32, height: u32, max: u32) -> [u32; 2] {
    let max = max.max(1);
    [width.clamp(1, max), height.clamp(1, max)]
}

#[derive(Debug)]
pub struct Pipelines {
    pub mesh: wgpu::RenderPipeline,
    pub lines: wgpu::RenderPipeline,
}

/// Everything bound to the window and GPU.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    /// Shared by every material bind group.
    pub material_layout: wgpu::BindGroupLayout,
    pub background: BackgroundResources,
    /// Sampled by every material whose map isn't ready.
    pub placeholder: texture::Texture,
    /// Shown wherever no background image covers the frame.
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        scene_config: &SceneConfig,
        camera: &Camera,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can draw to this surface")?;
        log::info!("device and queue on {:?}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("the GPU adapter refused to open a device")?;

        log::debug!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders assume an sRGB surface; any other format comes out too dark.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let max_texture = device.limits().max_texture_dimension_2d;
        let [width, height] = surface_size(size.width, size.height, max_texture);
        if [width, height] != [size.width, size.height] {
            log::warn!(
                "window is {}x{}, the surface is capped at {width}x{height}",
                size.width,
                size.height
            );
        }
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // The aspect follows the window, not the capped surface
        let projection = Projection::new(
            size.width,
            size.height,
            cgmath::Deg(scene_config.fovy),
            scene_config.znear,
            scene_config.zfar,
        );
        let camera = CameraResources::new(&device, camera, &projection);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let light = LightResources::new(LightUniform::unlit(), &device);

        let material_layout = material_layout(&device);
        let layout = mk_scene_layout(
            &device,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let pipelines = Pipelines {
            mesh: mk_mesh_pipeline(&device, &config, &layout),
            lines: mk_line_pipeline(&device, &config, &layout),
        };
        let background = BackgroundResources::new(&device, &config);
        let placeholder =
            texture::Texture::create_solid([255, 255, 255, 255], &device, &queue, "placeholder");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            material_layout,
            background,
            placeholder,
            clear_colour: wgpu::Color::BLACK,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Reconfigures the surface and depth buffer. Zero sized windows are skipped.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let [surface_width, surface_height] =
            surface_size(width, height, self.device.limits().max_texture_dimension_2d);
        self.config.width = surface_width;
        self.config.height = surface_height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [surface_width, surface_height],
            "depth_texture",
        );
        true
    }
}
