use std::borrow::Cow;

use wgpu::util::DeviceExt;

use crate::config::FieldConfig;

/// Per-particle vertex buffer layout, one quad instance per particle.
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy)]
#[repr(C)]
pub struct Instance {
    pub position: [f32; 2],
    pub radius: f32,
    pub alpha: f32,
    pub color: [f32; 4],
}

/// Draws the field with canvas-style motion trails.
///
/// A swapchain frame does not keep last frame's pixels, so the fade trick
/// (translucent background rectangle, then particles) runs against a
/// persistent accumulation texture which is then blitted to the surface.
pub struct RenderModule {
    surface_size_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,

    particle_bind_group: wgpu::BindGroup,
    fade_bind_group: wgpu::BindGroup,
    blit_layout: wgpu::BindGroupLayout,
    blit_bind_group: wgpu::BindGroup,
    blit_sampler: wgpu::Sampler,

    fade_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,

    format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    accum: wgpu::TextureView,
    clear_accum: bool,
}

impl RenderModule {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &FieldConfig,
        max_instances: usize,
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("render.wgsl"))),
        });

        let surface_size_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("surface size"),
            contents: bytemuck::bytes_of(&[width as f32, height as f32, 0.0f32, 0.0]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let fade_color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fade color"),
            contents: bytemuck::bytes_of(&[
                config.background[0],
                config.background[1],
                config.background[2],
                config.fade_alpha,
            ]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instances"),
            size: (max_instances.max(1) * std::mem::size_of::<Instance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Bind points are unique across the shader module; each pipeline's
        // layout only covers the slot its entry points touch.
        let uniform_layout_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let fade_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fade"),
            entries: &[uniform_layout_entry(0)],
        });
        let fade_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fade"),
            layout: &fade_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: fade_color_buffer.as_entire_binding(),
            }],
        });

        let particle_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("particles"),
            entries: &[uniform_layout_entry(1)],
        });
        let particle_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("particles"),
            layout: &particle_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 1,
                resource: surface_size_buffer.as_entire_binding(),
            }],
        });

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let accum = create_accum_texture(device, format, width, height);
        let blit_bind_group = create_blit_bind_group(device, &blit_layout, &accum, &blit_sampler);

        let alpha_target = Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let fade_pipeline = make_pipeline(
            device,
            &shader_module,
            "fade",
            &fade_layout,
            ("vs_fullscreen", "fs_fade"),
            &[],
            alpha_target.clone(),
        );
        let particle_pipeline = make_pipeline(
            device,
            &shader_module,
            "particles",
            &particle_layout,
            ("vs_particle", "fs_particle"),
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32x4
                ],
            }],
            alpha_target,
        );
        let blit_pipeline = make_pipeline(
            device,
            &shader_module,
            "blit",
            &blit_layout,
            ("vs_fullscreen", "fs_blit"),
            &[],
            Some(format.into()),
        );

        // The bind groups keep the uniform buffers alive; only the ones
        // rewritten later are stored.
        Self {
            surface_size_buffer,
            instance_buffer,
            instance_capacity: max_instances,

            particle_bind_group,
            fade_bind_group,
            blit_layout,
            blit_bind_group,
            blit_sampler,

            fade_pipeline,
            particle_pipeline,
            blit_pipeline,

            format,
            clear_color: wgpu::Color {
                r: config.background[0] as f64,
                g: config.background[1] as f64,
                b: config.background[2] as f64,
                a: 1.0,
            },
            accum,
            clear_accum: true,
        }
    }

    /// Recreates the accumulation target for a new surface size. Trails
    /// restart from a cleared background.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        queue.write_buffer(
            &self.surface_size_buffer,
            0,
            bytemuck::bytes_of(&[width as f32, height as f32, 0.0f32, 0.0]),
        );

        self.accum = create_accum_texture(device, self.format, width, height);
        self.blit_bind_group =
            create_blit_bind_group(device, &self.blit_layout, &self.accum, &self.blit_sampler);
        self.clear_accum = true;
    }

    pub fn write_instances(&self, queue: &wgpu::Queue, instances: &[Instance]) {
        debug_assert!(instances.len() <= self.instance_capacity);
        if instances.is_empty() {
            return;
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
    }

    /// Pass A: fade rectangle plus particle circles into the accumulation
    /// texture. Skipped entirely when paused so trails stay frozen.
    pub fn accumulate(&mut self, encoder: &mut wgpu::CommandEncoder, num_instances: u32) {
        let load = if self.clear_accum {
            self.clear_accum = false;
            wgpu::LoadOp::Clear(self.clear_color)
        } else {
            wgpu::LoadOp::Load
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("accumulate"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.accum,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_pipeline(&self.fade_pipeline);
        rpass.set_bind_group(0, &self.fade_bind_group, &[]);
        rpass.draw(0..3, 0..1);

        rpass.set_pipeline(&self.particle_pipeline);
        rpass.set_bind_group(0, &self.particle_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        rpass.draw(0..6, 0..num_instances);
    }

    /// Pass B: copy the accumulated image onto the swapchain frame.
    pub fn blit(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blit"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_pipeline(&self.blit_pipeline);
        rpass.set_bind_group(0, &self.blit_bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

#[allow(clippy::too_many_arguments)]
fn make_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    entry_points: (&str, &str),
    buffers: &[wgpu::VertexBufferLayout],
    target: Option<wgpu::ColorTargetState>,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some(entry_points.0),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(entry_points.1),
            targets: &[target],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_accum_texture(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("accumulation"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    accum: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("blit"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(accum),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
