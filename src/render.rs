//! Drawing a [`Scene`] with wgpu.
//!
//! The scene itself knows nothing about the GPU. [`Renderer`] keeps GPU copies
//! of every geometry, material and texture it has seen and batches all meshes
//! sharing geometry and material into a single instanced draw call.
//!
//! # Key types
//!
//! - [`SceneRenderer`] draws a scene through a camera; implemented by [`Renderer`]
//! - [`FrameScheduler`] asks the platform for the next frame
//! - [`Instanced`] one batch: a mesh, its material and an instance buffer

use std::{collections::{BTreeMap, HashMap}, iter};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::Camera,
    context::Context,
    data_structures::{
        geometry::Topology,
        instance::InstanceRaw,
        model::{DrawMesh, GpuMaterial, GpuMesh, MapBinding},
        scene_graph::{Background, GeometryId, MaterialId, NodeKind, Scene},
        texture::{Texture, fit_image},
    },
    pipelines::light::LightUniform,
    resources::texture::TextureId,
};

/// Draws the scene as seen by the camera.
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()>;
}

/// Schedules the next frame callback.
pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

/// Data for one instanced draw: a mesh, its material and the instance buffer.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a GpuMesh,
    pub material: &'a GpuMaterial,
    pub amount: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct BatchKey {
    lines: bool,
    geometry: GeometryId,
    material: MaterialId,
}

struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    amount: usize,
}

/// GPU copies of the geometries, materials and textures a scene refers to.
///
/// Entries are created the first time a scene mentions them and kept for the
/// lifetime of the renderer.
#[derive(Default)]
pub struct GpuCache {
    meshes: HashMap<GeometryId, GpuMesh>,
    materials: HashMap<MaterialId, GpuMaterial>,
    textures: HashMap<TextureId, Texture>,
}

impl GpuCache {
    pub fn insert_texture(&mut self, id: TextureId, texture: Texture) {
        self.textures.insert(id, texture);
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn mesh(&self, id: GeometryId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&GpuMaterial> {
        self.materials.get(&id)
    }

    /// Creates GPU copies of new geometries and materials and rebinds materials
    /// whose map became available.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        placeholder: &Texture,
        scene: &Scene,
    ) {
        for (id, geometry) in scene.geometries() {
            self.meshes.entry(id).or_insert_with(|| {
                log::debug!("uploading geometry {:?}", id);
                GpuMesh::new(device, &format!("{:?}", id), &geometry.tessellate())
            });
        }

        for (id, material) in scene.materials() {
            let binding = material.binding(|map| self.textures.contains_key(&map));
            let texture = match (binding, material.map) {
                (MapBinding::Loaded, Some(map)) => self.textures.get(&map).unwrap_or(placeholder),
                _ => placeholder,
            };
            match self.materials.get_mut(&id) {
                Some(gpu) if gpu.binding != binding => {
                    log::debug!("rebinding material {:?} to its loaded map", material.name);
                    gpu.rebind(device, material_layout, texture, binding);
                }
                Some(_) => (),
                None => {
                    self.materials.insert(
                        id,
                        GpuMaterial::new(device, material_layout, material, texture, binding),
                    );
                }
            }
        }
    }
}

pub struct Renderer {
    pub ctx: Context,
    cache: GpuCache,
    instances: HashMap<BatchKey, InstanceBuffer>,
    background: Option<TextureId>,
}

impl Renderer {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            cache: GpuCache::default(),
            instances: HashMap::new(),
            background: None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.ctx.resize(width, height)
    }

    /// Largest width or height an uploaded texture may have.
    pub fn max_texture_size(&self) -> u32 {
        self.ctx.device.limits().max_texture_dimension_2d
    }

    /// Uploads a finished texture. Materials and the background pick it up on
    /// the next render. Images above the device limit are downscaled first.
    pub fn upload_texture(&mut self, id: TextureId, image: image::RgbaImage, label: &str) {
        let image = fit_image(image, self.max_texture_size(), label);
        let texture = Texture::from_image(&self.ctx.device, &self.ctx.queue, &image, Some(label));
        self.cache.insert_texture(id, texture);
    }

    pub fn has_texture(&self, id: TextureId) -> bool {
        self.cache.texture(id).is_some()
    }

    fn prepare(&mut self, scene: &Scene) {
        self.cache.sync(
            &self.ctx.device,
            &self.ctx.material_layout,
            &self.ctx.placeholder,
            scene,
        );

        if let Background::Texture(id) = scene.background
            && self.background != Some(id)
            && let Some(texture) = self.cache.texture(id)
        {
            self.ctx.background.set_texture(&self.ctx.device, texture);
            self.background = Some(id);
        }
    }

    /// Groups every drawable node by geometry, material and primitive.
    fn batches(scene: &Scene) -> BTreeMap<BatchKey, Vec<InstanceRaw>> {
        let mut batches: BTreeMap<BatchKey, Vec<InstanceRaw>> = BTreeMap::new();
        for (_, node) in scene.nodes() {
            let Some((geometry, material)) = node.drawable() else {
                continue;
            };
            let helper = matches!(node.kind, NodeKind::Helper { .. });
            let wireframe = scene.material(material).is_some_and(|m| m.wireframe);
            let line_geometry = scene
                .geometry(geometry)
                .is_some_and(|g| g.topology() == Topology::Lines);
            let key = BatchKey {
                lines: helper || wireframe || line_geometry,
                geometry,
                material,
            };
            batches
                .entry(key)
                .or_default()
                .push(node.transform.to_raw());
        }
        batches
    }

    fn upload_instances(&mut self, batches: BTreeMap<BatchKey, Vec<InstanceRaw>>) {
        for buffer in self.instances.values_mut() {
            buffer.amount = 0;
        }
        for (key, raw) in batches {
            let contents: &[u8] = bytemuck::cast_slice(&raw);
            match self.instances.get_mut(&key) {
                Some(buffer) if buffer.capacity >= raw.len() => {
                    self.ctx.queue.write_buffer(&buffer.buffer, 0, contents);
                    buffer.amount = raw.len();
                }
                _ => {
                    let buffer = self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                    self.instances.insert(
                        key,
                        InstanceBuffer {
                            buffer,
                            capacity: raw.len(),
                            amount: raw.len(),
                        },
                    );
                }
            }
        }
    }

    fn collect(&self) -> (Vec<Instanced<'_>>, Vec<Instanced<'_>>) {
        let mut keys: Vec<_> = self.instances.keys().copied().collect();
        keys.sort();
        let mut solids = Vec::new();
        let mut lines = Vec::new();
        for key in keys {
            let buffer = &self.instances[&key];
            if buffer.amount == 0 {
                continue;
            }
            let (Some(mesh), Some(material)) =
                (self.cache.mesh(key.geometry), self.cache.material(key.material))
            else {
                log::warn!("batch {:?} has no GPU resources", key);
                continue;
            };
            let instanced = Instanced {
                instance: &buffer.buffer,
                mesh,
                material,
                amount: buffer.amount,
            };
            if key.lines {
                lines.push(instanced);
            } else {
                solids.push(instanced);
            }
        }
        (solids, lines)
    }
}

impl SceneRenderer for Renderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) -> anyhow::Result<()> {
        self.prepare(scene);

        let (point, ambient) = scene.lights();
        self.ctx
            .light
            .write(&self.ctx.queue, LightUniform::new(point, ambient));
        self.ctx
            .camera
            .write(&self.ctx.queue, camera, &self.ctx.projection);
        self.upload_instances(Self::batches(scene));

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.ctx.window.inner_size();
                log::debug!("surface lost, reconfiguring at {}x{}", size.width, size.height);
                self.ctx.resize(size.width, size.height);
                return Ok(());
            }
            Err(e) => return Err(anyhow::anyhow!("cannot acquire the next frame: {e}")),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.ctx.background.draw(&mut render_pass);

            let (solids, lines) = self.collect();
            render_pass.set_pipeline(&self.ctx.pipelines.mesh);
            for instanced in solids {
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_mesh_instanced(
                    instanced.mesh,
                    instanced.material,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }

            render_pass.set_pipeline(&self.ctx.pipelines.lines);
            for instanced in lines {
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_lines_instanced(
                    instanced.mesh,
                    instanced.material,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::{
        geometry::Geometry,
        model::Material,
        scene_graph::{Node, PointLight},
    };

    fn sphere(radius: f32) -> Geometry {
        Geometry::Sphere {
            radius,
            width_segments: 8,
            height_segments: 8,
        }
    }

    fn grid() -> Geometry {
        Geometry::Grid {
            size: 10.0,
            divisions: 2,
            centre_colour: [0.3; 3],
            line_colour: [0.5; 3],
        }
    }

    fn line_batches(batches: &BTreeMap<BatchKey, Vec<InstanceRaw>>) -> Vec<BatchKey> {
        batches.keys().filter(|key| key.lines).copied().collect()
    }

    #[test]
    fn meshes_sharing_geometry_and_material_form_one_batch() {
        let mut scene = Scene::new();
        let star = scene.add_geometry(sphere(0.25));
        let white = scene.add_material(Material::standard("star", [1.0; 3]));
        for i in 0..200 {
            scene.add(Node::mesh("star", star, white).at(Vector3::new(i as f32, 0.0, 0.0)));
        }

        let batches = Renderer::batches(&scene);
        assert_eq!(batches.len(), 1);
        let (key, instances) = batches.iter().next().unwrap();
        assert!(!key.lines);
        assert_eq!(instances.len(), 200);
    }

    #[test]
    fn a_different_material_splits_the_batch() {
        let mut scene = Scene::new();
        let ball = scene.add_geometry(sphere(1.0));
        let red = scene.add_material(Material::standard("red", [1.0, 0.0, 0.0]));
        let blue = scene.add_material(Material::standard("blue", [0.0, 0.0, 1.0]));
        scene.add(Node::mesh("a", ball, red));
        scene.add(Node::mesh("b", ball, red));
        scene.add(Node::mesh("c", ball, blue));

        let sizes: Vec<_> = Renderer::batches(&scene).values().map(Vec::len).collect();
        assert_eq!(sizes, [2, 1]);
    }

    #[test]
    fn helpers_wireframes_and_line_geometry_go_to_the_line_pipeline() {
        let mut scene = Scene::new();
        let ball = scene.add_geometry(sphere(1.0));
        let floor = scene.add_geometry(grid());
        let solid = scene.add_material(Material::standard("solid", [1.0; 3]));
        let wire = scene.add_material(Material::standard("wire", [1.0; 3]).with_wireframe());
        let plain = scene.add_material(Material::basic("plain", [1.0; 3]));

        scene.add(Node::mesh("solid", ball, solid));
        scene.add(Node::mesh("torus", ball, wire));
        scene.add(Node::mesh("floor", floor, plain));
        scene.add(Node::new(
            "helper",
            NodeKind::Helper {
                geometry: ball,
                material: plain,
                follows: None,
            },
        ));

        let batches = Renderer::batches(&scene);
        assert_eq!(batches.len(), 4);
        let lines: Vec<_> = line_batches(&batches)
            .into_iter()
            .map(|key| (key.geometry, key.material))
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&(ball, wire)));
        assert!(lines.contains(&(floor, plain)));
        assert!(lines.contains(&(ball, plain)));
        assert!(!lines.contains(&(ball, solid)));
    }

    #[test]
    fn lights_are_not_drawn() {
        let mut scene = Scene::new();
        scene.add(Node::new(
            "point light",
            NodeKind::PointLight(PointLight {
                colour: [1.0; 3],
                intensity: 1.0,
                decay: 0.0,
            }),
        ));
        assert!(Renderer::batches(&scene).is_empty());
    }

    #[test]
    fn instances_carry_the_node_transform() {
        let mut scene = Scene::new();
        let ball = scene.add_geometry(sphere(1.0));
        let white = scene.add_material(Material::basic("white", [1.0; 3]));
        scene.add(Node::mesh("moon", ball, white).at(Vector3::new(-10.0, 0.0, 30.0)));

        let batches = Renderer::batches(&scene);
        let raw = &batches.values().next().unwrap()[0];
        let expected = scene.nodes().next().unwrap().1.transform.to_raw();
        assert_eq!(bytemuck::bytes_of(raw), bytemuck::bytes_of(&expected));
    }
}
