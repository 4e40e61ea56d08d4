//! Progressive path-tracing renderer.
//!
//! One fullscreen pass with two color targets: the surface (display) and the
//! accumulation source film. The shader blends the new stochastic estimate
//! with the previously accumulated average read from the destination film,
//! weighted by the frame counter; after the pass the source is copied whole
//! into the destination for the next cycle.

use pathlight_core::film::{AccumulationPair, Extent, FilmBuffer, FilmError};
use pathlight_core::sampling::MAX_SUBDIVISIONS;
use pathlight_core::schedule::FrameSnapshot;
use pathlight_core::uniforms::{RenderUniforms, SamplingUniforms};

/// Accumulation film format; matches the shader's second color target.
const FILM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// One side of the ping-pong film pair on the GPU.
pub struct FilmTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: Extent,
}

impl FilmTexture {
    fn new(device: &wgpu::Device, extent: Extent, label: &str, usage: wgpu::TextureUsages) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FILM_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            extent,
        }
    }

    /// Render source: drawn into each cycle, then copied out.
    fn source(device: &wgpu::Device, extent: Extent) -> Self {
        Self::new(
            device,
            extent,
            "pathlight film source",
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )
    }

    /// Read destination: bound to the shader, written only by the copy.
    fn destination(device: &wgpu::Device, extent: Extent) -> Self {
        Self::new(
            device,
            extent,
            "pathlight film destination",
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        )
    }
}

impl FilmBuffer for FilmTexture {
    fn extent(&self) -> Extent {
        self.extent
    }
}

/// Pipeline, uniform/jitter buffers, and the film bind group.
pub struct Tracer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,

    render_ubo: wgpu::Buffer,
    sampling_ubo: wgpu::Buffer,
    jitter_buffer: wgpu::Buffer,
}

impl Tracer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pathlight tracer shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/tracer.wgsl").into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pathlight tracer bgl"),
                entries: &[
                    uniform_entry(0, std::mem::size_of::<RenderUniforms>() as u64),
                    uniform_entry(1, std::mem::size_of::<SamplingUniforms>() as u64),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pathlight tracer pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pathlight tracer pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: FILM_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        let render_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pathlight render ubo"),
            size: std::mem::size_of::<RenderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampling_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pathlight sampling ubo"),
            size: std::mem::size_of::<SamplingUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Sized for the maximum subdivision factor; only the live prefix is
        // rewritten on regeneration.
        let jitter_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pathlight jitter buffer"),
            size: (MAX_SUBDIVISIONS * MAX_SUBDIVISIONS) as u64 * 2 * 4,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Placeholder bind group until the first film pair exists.
        let placeholder = FilmTexture::destination(device, Extent::new(1, 1));
        let bind_group = make_bind_group(
            device,
            &bind_group_layout,
            &render_ubo,
            &sampling_ubo,
            &jitter_buffer,
            &placeholder,
        );

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            render_ubo,
            sampling_ubo,
            jitter_buffer,
        }
    }

    /// Creates a validated film pair for `extent` and rebinds the shader to
    /// its destination. Both films are always created together.
    pub fn create_films(
        &mut self,
        device: &wgpu::Device,
        extent: Extent,
    ) -> Result<AccumulationPair<FilmTexture>, FilmError> {
        let pair = AccumulationPair::new(
            FilmTexture::source(device, extent),
            FilmTexture::destination(device, extent),
        )?;

        self.bind_group = make_bind_group(
            device,
            &self.bind_group_layout,
            &self.render_ubo,
            &self.sampling_ubo,
            &self.jitter_buffer,
            pair.destination(),
        );

        Ok(pair)
    }

    /// Records one render submission for `snapshot`.
    ///
    /// Uploads whatever the snapshot marks dirty (the sampling block always:
    /// its frame counter changes every cycle), then draws the fullscreen
    /// pass into the surface and the film source.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        snapshot: &FrameSnapshot<'_>,
        source: &FilmTexture,
    ) {
        if snapshot.dirty.render {
            queue.write_buffer(&self.render_ubo, 0, bytemuck::bytes_of(&snapshot.render));
        }
        queue.write_buffer(&self.sampling_ubo, 0, bytemuck::bytes_of(&snapshot.sampling));
        if snapshot.dirty.jitter {
            queue.write_buffer(&self.jitter_buffer, 0, bytemuck::cast_slice(snapshot.jitter));
        }

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pathlight trace pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &source.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
            ],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw(0..4, 0..1);
    }

    /// The ping-pong step: full-extent copy of the source film into the
    /// destination read by the next cycle.
    pub fn copy_film(
        encoder: &mut wgpu::CommandEncoder,
        source: &FilmTexture,
        destination: &FilmTexture,
    ) {
        encoder.copy_texture_to_texture(
            source.texture.as_image_copy(),
            destination.texture.as_image_copy(),
            wgpu::Extent3d {
                width: source.extent.width,
                height: source.extent.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

// The render block feeds both stages (the vertex shader maps clip space to
// image-plane coordinates with the aspect ratio).
fn uniform_entry(binding: u32, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: std::num::NonZeroU64::new(size),
        },
        count: None,
    }
}

fn make_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    render_ubo: &wgpu::Buffer,
    sampling_ubo: &wgpu::Buffer,
    jitter_buffer: &wgpu::Buffer,
    destination: &FilmTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("pathlight tracer bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: render_ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: sampling_ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: jitter_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&destination.view),
            },
        ],
    })
}
