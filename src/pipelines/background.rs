use crate::{
    data_structures::texture::{Texture, create_default_sampler},
    pipelines::basic::{Primitive, mk_render_pipeline},
    resources::texture::background_layout,
};

/// Image stretched over the whole viewport behind the scene.
pub struct BackgroundResources {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// `None` until the background image is uploaded.
    pub bind_group: Option<wgpu::BindGroup>,
}

impl BackgroundResources {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let bind_group_layout = background_layout(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            config.format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_FORMAT),
            &[],
            Primitive::Backdrop,
            shader,
        );
        Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn set_texture(&mut self, device: &wgpu::Device, texture: &Texture) {
        let fallback_sampler;
        let sampler = match &texture.sampler {
            Some(sampler) => sampler,
            None => {
                fallback_sampler = create_default_sampler(device);
                &fallback_sampler
            }
        };
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("background_bind_group"),
        }));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(bind_group) = &self.bind_group {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}
