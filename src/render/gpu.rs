//! Shader implementation of the transform and the filters on wgpu.
//!
//! The presentation point is a queue submit followed by a blocking device poll; there is no
//! swapchain, so timings reflect processing cost rather than vsync.

use crate::{
    foundation::core::{AffineParams, BackendKind, FilterKind, FilterParams, Frame, Resolution},
    foundation::error::{VidfxError, VidfxResult},
    render::backend::{FrameBackend, FrameSettings, check_frame},
    render::shaders::ShaderSources,
    transform::affine::affine_matrix,
};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Uniform block shared by every program. Mirrors `Params` in `common.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct DrawUniforms {
    affine: [[f32; 4]; 3],
    tex_size: [f32; 2],
    block: f32,
    threshold: f32,
    keep_color: [f32; 4],
}

impl DrawUniforms {
    pub(crate) fn new(
        width: u32,
        height: u32,
        filter_params: &FilterParams,
        affine_params: &AffineParams,
    ) -> Self {
        let p = filter_params.sanitized();
        let [r, g, b] = p.keep_color.to_unit_rgb();
        Self {
            affine: affine_matrix(affine_params, width, height).to_gpu_columns(),
            tex_size: [width as f32, height as f32],
            block: p.effective_block() as f32,
            threshold: p.threshold as f32 / 255.0,
            keep_color: [r, g, b, 1.0],
        }
    }
}

/// Device and queue of the adapter picked for processing.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new() -> VidfxResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                VidfxError::gpu("no gpu adapter available")
            }
            other => VidfxError::gpu(format!("wgpu request_adapter failed: {other:?}")),
        })?;
        tracing::debug!(adapter = ?adapter.get_info().name, "gpu adapter acquired");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("vidfx_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| VidfxError::gpu(format!("wgpu request_device failed: {e:?}")))?;

        Ok(Self { device, queue })
    }
}

/// The three compiled programs and the layout they share.
pub struct ShaderBackend {
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    passthrough: wgpu::RenderPipeline,
    pixelate: wgpu::RenderPipeline,
    keep_color: wgpu::RenderPipeline,
}

impl ShaderBackend {
    /// Compile every program. Any compile or link failure is returned with the compiler's
    /// diagnostic; nothing is kept from a partial build.
    pub fn new(ctx: &GpuContext, sources: &ShaderSources) -> VidfxResult<Self> {
        let device = &ctx.device;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vidfx_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<DrawUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vidfx_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vidfx_params"),
            size: std::mem::size_of::<DrawUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let build = |filter| {
            let (name, src) = sources.program(filter);
            compile_program(device, &pipeline_layout, name, src)
        };
        let passthrough = build(FilterKind::None)?;
        let pixelate = build(FilterKind::Pixelate)?;
        let keep_color = build(FilterKind::KeepColor)?;

        Ok(Self {
            bind_group_layout,
            uniforms,
            passthrough,
            pixelate,
            keep_color,
        })
    }

    fn pipeline(&self, filter: FilterKind) -> &wgpu::RenderPipeline {
        match filter {
            FilterKind::None => &self.passthrough,
            FilterKind::Pixelate => &self.pixelate,
            FilterKind::KeepColor => &self.keep_color,
        }
    }

    /// Draw `input` into `target` with the program for `filter`, warping by `affine_params`.
    /// Pass [`AffineParams::IDENTITY`] to leave geometry alone. Submits but does not wait.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        ctx: &GpuContext,
        input: &wgpu::TextureView,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
        filter: FilterKind,
        filter_params: &FilterParams,
        affine_params: &AffineParams,
    ) {
        let uniforms = DrawUniforms::new(width, height, filter_params, affine_params);
        ctx.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vidfx_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.uniforms.as_entire_binding(),
                },
            ],
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vidfx_draw_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vidfx_draw_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
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
            rp.set_pipeline(self.pipeline(filter));
            rp.set_bind_group(0, &bind_group, &[]);
            rp.draw(0..4, 0..1);
        }
        ctx.queue.submit(Some(encoder.finish()));
    }
}

fn compile_program(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    name: &'static str,
    source: &str,
) -> VidfxResult<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(name),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(VidfxError::shader(name, err.to_string()));
    }
    tracing::debug!(program = name, "shader program compiled");
    Ok(pipeline)
}

struct Targets {
    width: u32,
    height: u32,
    input: wgpu::Texture,
    input_view: wgpu::TextureView,
    output: wgpu::Texture,
    output_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    readback_bytes_per_row: u32,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> VidfxResult<Self> {
        let texture = |label: &str, usage: wgpu::TextureUsages| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage,
                view_formats: &[],
            })
        };
        let input = texture(
            "vidfx_input",
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let output = texture(
            "vidfx_output",
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );

        let bytes_per_row_unpadded = width
            .checked_mul(4)
            .ok_or_else(|| VidfxError::gpu("render target width overflow"))?;
        let readback_bytes_per_row =
            align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer_size = u64::from(readback_bytes_per_row)
            .checked_mul(u64::from(height))
            .ok_or_else(|| VidfxError::gpu("readback buffer size overflow"))?;
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vidfx_readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            width,
            height,
            input_view: input.create_view(&wgpu::TextureViewDescriptor::default()),
            input,
            output_view: output.create_view(&wgpu::TextureViewDescriptor::default()),
            output,
            readback,
            readback_bytes_per_row,
        })
    }
}

/// [`FrameBackend`] that uploads the raw frame and applies transform + filter in the shader.
pub struct GpuBackend {
    ctx: GpuContext,
    shaders: ShaderBackend,
    targets: Option<Targets>,
    presented: bool,
}

impl GpuBackend {
    pub fn new(sources: &ShaderSources) -> VidfxResult<Self> {
        let ctx = GpuContext::new()?;
        let shaders = ShaderBackend::new(&ctx, sources)?;
        Ok(Self {
            ctx,
            shaders,
            targets: None,
            presented: false,
        })
    }

    fn ensure_targets(&mut self, width: u32, height: u32) -> VidfxResult<&Targets> {
        let stale = self
            .targets
            .as_ref()
            .is_none_or(|t| t.width != width || t.height != height);
        if stale {
            tracing::debug!(width, height, "gpu targets (re)created");
            self.targets = Some(Targets::new(&self.ctx.device, width, height)?);
            self.presented = false;
        }
        self.targets
            .as_ref()
            .ok_or_else(|| VidfxError::gpu("gpu targets not initialized"))
    }

    fn wait_idle(&self) -> VidfxResult<()> {
        self.ctx
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| VidfxError::gpu(format!("wgpu poll failed: {e:?}")))?;
        Ok(())
    }
}

impl FrameBackend for GpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn resize(&mut self, resolution: Resolution) -> VidfxResult<()> {
        self.ensure_targets(resolution.width, resolution.height)?;
        Ok(())
    }

    fn render(&mut self, frame: &Frame, settings: &FrameSettings) -> VidfxResult<()> {
        check_frame(frame)?;
        self.ensure_targets(frame.width, frame.height)?;
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| VidfxError::gpu("gpu targets not initialized"))?;

        self.ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.input,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            extent(frame.width, frame.height),
        );
        self.shaders.draw(
            &self.ctx,
            &targets.input_view,
            &targets.output_view,
            frame.width,
            frame.height,
            settings.filter,
            &settings.filter_params,
            &settings.effective_affine(),
        );
        self.wait_idle()?;
        self.presented = true;
        Ok(())
    }

    fn readback(&mut self) -> VidfxResult<Frame> {
        if !self.presented {
            return Err(VidfxError::gpu("nothing rendered yet"));
        }
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| VidfxError::gpu("gpu targets not initialized"))?;
        let (width, height) = (targets.width, targets.height);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vidfx_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &targets.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(targets.readback_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent(width, height),
        );
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = targets.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.wait_idle()?;
        rx.recv()
            .map_err(|_| VidfxError::gpu("readback channel closed"))?
            .map_err(|e| VidfxError::gpu(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let row_bytes = width as usize * 4;
        let padded = targets.readback_bytes_per_row as usize;
        let mut rgba = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * padded;
            rgba.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        targets.readback.unmap();

        Frame::from_rgba8(width, height, &rgba)
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

#[cfg(test)]
#[path = "../../tests/unit/render/gpu.rs"]
mod tests;
