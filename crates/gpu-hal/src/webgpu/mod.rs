//! wgpu render backend.
//!
//! Render targets are `Rgba8Unorm` textures; the screen surface is an owned
//! offscreen texture of the same format that the host presents or reads
//! back. Every command is encoded and submitted immediately, so GPU
//! execution order equals issue order.
//!
//! Programs follow the binding convention documented on
//! [`ProgramSource`]: one uniform buffer of packed `f32`s, one sampler, then
//! the sampled textures. The sampler uses the filters of the first bound
//! texture. A draw must not sample its own destination.

mod readback;

use std::borrow::Cow;
use std::collections::HashMap;

use aft_common::{
    FilterMode, GpuError, ProgramId, ProgramSource, RenderBackend, RenderTarget,
    Resolution, TargetDesc, TextureHandle, Uniforms,
};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

pub use readback::read_texture_tight;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTarget {
    desc: TargetDesc,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuProgram {
    name: String,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    floats: Vec<&'static str>,
    textures: Vec<&'static str>,
}

/// Render backend on a wgpu device.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    targets: HashMap<TextureHandle, GpuTarget>,
    programs: Vec<GpuProgram>,
    samplers: HashMap<(FilterMode, FilterMode), wgpu::Sampler>,
    screen: GpuTarget,
    /// Bound when a texture uniform is left unset.
    fallback: GpuTarget,
    bound: Option<TextureHandle>,
    next_handle: u64,
}

fn to_wgpu_filter(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn check_desc(desc: &TargetDesc) -> Result<(), GpuError> {
    if desc.width == 0 || desc.height == 0 {
        return Err(GpuError::AllocFailed {
            width: desc.width,
            height: desc.height,
        });
    }
    Ok(())
}

fn allocate(device: &wgpu::Device, desc: TargetDesc, label: &str) -> GpuTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTarget {
        desc,
        texture,
        view,
    }
}

impl WgpuBackend {
    /// Wrap an existing device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, screen: Resolution) -> Self {
        let screen_desc = TargetDesc::new(screen.width.max(1), screen.height.max(1));
        let screen = allocate(&device, screen_desc, "afterimage.screen");
        let fallback = allocate(&device, TargetDesc::new(1, 1), "afterimage.fallback");

        Self {
            device,
            queue,
            targets: HashMap::new(),
            programs: Vec::new(),
            samplers: HashMap::new(),
            screen,
            fallback,
            bound: None,
            next_handle: 1,
        }
    }

    /// Request a default adapter and device without a window surface.
    pub fn headless(screen: Resolution) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| GpuError::DeviceInit("no suitable GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("afterimage.device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| GpuError::DeviceInit(e.to_string()))?;

        info!(adapter = %adapter.get_info().name, "Created wgpu device");
        Ok(Self::new(device, queue, screen))
    }

    /// The screen surface texture, for presenting or blitting to a swapchain.
    pub fn screen_texture(&self) -> &wgpu::Texture {
        &self.screen.texture
    }

    fn target(&self, texture: TextureHandle) -> Result<&GpuTarget, GpuError> {
        self.targets
            .get(&texture)
            .ok_or(GpuError::UnknownTarget(texture))
    }

    fn bound_target(&self) -> Result<&GpuTarget, GpuError> {
        match self.bound {
            Some(handle) => self.target(handle),
            None => Ok(&self.screen),
        }
    }

    fn ensure_sampler(&mut self, min: FilterMode, mag: FilterMode) {
        let device = &self.device;
        self.samplers.entry((min, mag)).or_insert_with(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("afterimage.sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: to_wgpu_filter(mag),
                min_filter: to_wgpu_filter(min),
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        });
    }

    fn submit_pass(
        &self,
        view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        draw: Option<(&wgpu::RenderPipeline, &wgpu::BindGroup)>,
    ) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("afterimage.encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("afterimage.pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some((pipeline, bind_group)) = draw {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<RenderTarget, GpuError> {
        check_desc(desc)?;

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        let target = allocate(&self.device, *desc, &format!("afterimage.target.{}", handle.0));
        self.targets.insert(handle, target);

        debug!(
            texture = %handle,
            width = desc.width,
            height = desc.height,
            "Allocated wgpu render target"
        );

        Ok(RenderTarget::from_raw(handle, *desc))
    }

    fn resize_target(
        &mut self,
        target: &mut RenderTarget,
        resolution: Resolution,
    ) -> Result<(), GpuError> {
        let mut desc = *target.desc();
        desc.width = resolution.width;
        desc.height = resolution.height;
        check_desc(&desc)?;

        let handle = target.texture();
        if !self.has_target(handle) {
            return Err(GpuError::UnknownTarget(handle));
        }
        let resized = allocate(&self.device, desc, &format!("afterimage.target.{}", handle.0));
        self.targets.insert(handle, resized);
        target.set_resolution(resolution);
        Ok(())
    }

    fn has_target(&self, texture: TextureHandle) -> bool {
        self.targets.contains_key(&texture)
    }

    fn write_target(&mut self, target: &RenderTarget, pixels: &[u8]) -> Result<(), GpuError> {
        let gpu = self.target(target.texture())?;
        let expected = Resolution::new(gpu.desc.width, gpu.desc.height).rgba_byte_size();
        if pixels.len() != expected {
            return Err(GpuError::SizeMismatch {
                expected,
                got: pixels.len(),
            });
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * gpu.desc.width),
                rows_per_image: Some(gpu.desc.height),
            },
            wgpu::Extent3d {
                width: gpu.desc.width,
                height: gpu.desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn read_target(&mut self, target: &RenderTarget) -> Result<Vec<u8>, GpuError> {
        let gpu = self.target(target.texture())?;
        read_texture_tight(
            &self.device,
            &self.queue,
            &gpu.texture,
            gpu.desc.width,
            gpu.desc.height,
        )
    }

    fn set_screen_size(&mut self, resolution: Resolution) -> Result<(), GpuError> {
        let desc = TargetDesc::new(resolution.width, resolution.height);
        check_desc(&desc)?;
        self.screen = allocate(&self.device, desc, "afterimage.screen");
        Ok(())
    }

    fn screen_size(&self) -> Resolution {
        Resolution::new(self.screen.desc.width, self.screen.desc.height)
    }

    fn read_screen(&mut self) -> Result<Vec<u8>, GpuError> {
        read_texture_tight(
            &self.device,
            &self.queue,
            &self.screen.texture,
            self.screen.desc.width,
            self.screen.desc.height,
        )
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError> {
        let floats: Vec<&'static str> = source.float_uniforms().map(|u| u.name).collect();
        let textures: Vec<&'static str> = source.texture_uniforms().map(|u| u.name).collect();

        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        for i in 0..textures.len() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let wgsl = format!("{}\n{}", source.vertex_wgsl, source.fragment_wgsl);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.name.as_str()),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(wgsl)),
            });

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(source.name.as_str()),
                entries: &entries,
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(source.name.as_str()),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(source.name.as_str()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::ProgramCompile {
                name: source.name.clone(),
                reason: err.to_string(),
            });
        }

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            name: source.name.clone(),
            pipeline,
            layout,
            floats,
            textures,
        });

        debug!(program = %source.name, id = %id, "Compiled wgpu program");
        Ok(id)
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        self.bound = target.map(|t| t.texture());
    }

    fn clear(&mut self) -> Result<(), GpuError> {
        let view = &self.bound_target()?.view;
        self.submit_pass(view, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), None);
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: ProgramId, uniforms: &Uniforms) -> Result<(), GpuError> {
        let prog = self
            .programs
            .get(program.0 as usize)
            .ok_or(GpuError::UnknownProgram(program))?;

        // Pad to a 16-byte multiple for uniform buffer layout rules.
        let mut floats: Vec<f32> = prog
            .floats
            .iter()
            .map(|name| uniforms.float(name).unwrap_or(0.0))
            .collect();
        floats.resize(floats.len().div_ceil(4).max(1) * 4, 0.0);

        let mut filters = None;
        let mut views = Vec::with_capacity(prog.textures.len());
        for name in &prog.textures {
            let target = match uniforms.texture(name) {
                Some(handle) => self.target(handle)?,
                None => &self.fallback,
            };
            filters.get_or_insert((target.desc.min_filter, target.desc.mag_filter));
            views.push(
                target
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
            );
        }
        let (min, mag) = filters.unwrap_or((FilterMode::Linear, FilterMode::Nearest));
        let name = prog.name.clone();

        self.ensure_sampler(min, mag);
        let sampler = &self.samplers[&(min, mag)];

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("afterimage.uniforms"),
                contents: bytemuck::cast_slice(&floats),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let prog = &self.programs[program.0 as usize];
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];
        for (i, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name.as_str()),
            layout: &prog.layout,
            entries: &entries,
        });

        let view = &self.bound_target()?.view;
        self.submit_pass(view, wgpu::LoadOp::Load, Some((&prog.pipeline, &bind_group)));

        debug!(program = %name, target = ?self.bound, "Submitted fullscreen draw");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aft_effects::copy::{OPACITY, T_DIFFUSE};
    use aft_effects::{AfterimageShader, CopyShader, Effect};

    fn backend() -> Option<WgpuBackend> {
        match WgpuBackend::headless(Resolution::new(4, 4)) {
            Ok(backend) => Some(backend),
            Err(err) => {
                eprintln!("skipping wgpu test: {err}");
                None
            }
        }
    }

    #[test]
    fn builtin_programs_compile() {
        let Some(mut backend) = backend() else {
            return;
        };
        backend
            .compile_program(&AfterimageShader::new().program_source())
            .unwrap();
        backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
    }

    #[test]
    fn copy_roundtrips_pixels() {
        let Some(mut backend) = backend() else {
            return;
        };
        let src = backend.create_target(&TargetDesc::new(4, 4)).unwrap();
        let pixels: Vec<u8> = (0..64u8).map(|i| i * 3).collect();
        backend.write_target(&src, &pixels).unwrap();

        let copy = backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
        backend.set_render_target(None);
        backend.clear().unwrap();
        backend
            .draw_fullscreen(
                copy,
                &Uniforms::new()
                    .push_f32(OPACITY, 1.0)
                    .push_texture(T_DIFFUSE, src.texture()),
            )
            .unwrap();

        assert_eq!(backend.read_screen().unwrap(), pixels);
    }
}
