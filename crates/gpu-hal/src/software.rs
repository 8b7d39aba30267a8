//! CPU rasterizer implementing [`RenderBackend`] (software fallback).
//!
//! Every fullscreen draw evaluates the program's CPU reference fragment once
//! per destination pixel. Use it when:
//! - No GPU adapter is available
//! - A stage needs deterministic pixel output (tests, golden images)
//! - GPU output needs validating against a reference implementation
//!
//! # Sampling
//!
//! A fragment at pixel `(x, y)` of a `w x h` destination has
//! `uv = ((x + 0.5) / w, (y + 0.5) / h)`. A source of the same size is read
//! texel-exact. A larger source (minification) uses the target's
//! `min_filter`, a smaller one (magnification) its `mag_filter`. Addressing
//! clamps to the edge. Texels are normalised `u8 / 255`; fragment outputs are
//! clamped and rounded back to RGBA8.
//!
//! Draws read the pre-draw contents of every texture, so binding the
//! destination as a sampled texture is well defined (but never needed by
//! the afterimage stage, which ping-pongs).

use std::collections::HashMap;

use aft_common::color::{pack_rgba8, unpack_rgba8};
use aft_common::{
    FilterMode, Fragment, FragmentFn, GpuError, ProgramId, ProgramSource,
    RenderBackend, RenderTarget, Resolution, TargetDesc, TextureHandle, Uniforms,
};
use tracing::debug;

/// One command as issued to the backend, for inspecting draw order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Destination bound (`None` = screen).
    Bind(Option<TextureHandle>),
    /// Destination cleared.
    Clear(Option<TextureHandle>),
    /// Fullscreen draw into `target` sampling `textures` (in uniform order).
    Draw {
        program: String,
        target: Option<TextureHandle>,
        textures: Vec<TextureHandle>,
    },
}

struct Surface {
    desc: TargetDesc,
    pixels: Vec<u8>,
}

impl Surface {
    fn new(desc: TargetDesc) -> Self {
        let len = Resolution::new(desc.width, desc.height).rgba_byte_size();
        Self {
            desc,
            pixels: vec![0u8; len],
        }
    }

    fn resolution(&self) -> Resolution {
        Resolution::new(self.desc.width, self.desc.height)
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y as usize * self.desc.width as usize + x as usize) * 4;
        unpack_rgba8([
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ])
    }

    fn sample_nearest(&self, uv: [f32; 2]) -> [f32; 4] {
        let x = texel_index(uv[0], self.desc.width);
        let y = texel_index(uv[1], self.desc.height);
        self.texel(x, y)
    }

    fn sample_linear(&self, uv: [f32; 2]) -> [f32; 4] {
        let (w, h) = (self.desc.width as i64, self.desc.height as i64);
        let fx = uv[0] * w as f32 - 0.5;
        let fy = uv[1] * h as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let clamp_x = |x: i64| x.clamp(0, w - 1) as u32;
        let clamp_y = |y: i64| y.clamp(0, h - 1) as u32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(clamp_x(x0), clamp_y(y0));
        let c10 = self.texel(clamp_x(x0 + 1), clamp_y(y0));
        let c01 = self.texel(clamp_x(x0), clamp_y(y0 + 1));
        let c11 = self.texel(clamp_x(x0 + 1), clamp_y(y0 + 1));

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            let top = c00[c] * (1.0 - tx) + c10[c] * tx;
            let bottom = c01[c] * (1.0 - tx) + c11[c] * tx;
            out[c] = top * (1.0 - ty) + bottom * ty;
        }
        out
    }

    /// Sample as seen from a destination of size `dest`.
    fn sample(&self, uv: [f32; 2], dest: Resolution) -> [f32; 4] {
        let src = self.resolution();
        if src.is_empty() {
            return [0.0; 4];
        }
        let filter = if src.width > dest.width || src.height > dest.height {
            self.desc.min_filter
        } else if src.width < dest.width || src.height < dest.height {
            self.desc.mag_filter
        } else {
            FilterMode::Nearest
        };
        match filter {
            FilterMode::Nearest => self.sample_nearest(uv),
            FilterMode::Linear => self.sample_linear(uv),
        }
    }
}

#[inline]
fn texel_index(coord: f32, size: u32) -> u32 {
    ((coord * size as f32).floor().max(0.0) as u32).min(size - 1)
}

struct SoftProgram {
    name: String,
    fragment: FragmentFn,
}

struct SoftFragment<'a> {
    uv: [f32; 2],
    dest: Resolution,
    uniforms: &'a Uniforms,
    surfaces: &'a HashMap<TextureHandle, Surface>,
}

impl Fragment for SoftFragment<'_> {
    fn uv(&self) -> [f32; 2] {
        self.uv
    }

    fn sample(&self, name: &str) -> [f32; 4] {
        self.uniforms
            .texture(name)
            .and_then(|handle| self.surfaces.get(&handle))
            .map(|surface| surface.sample(self.uv, self.dest))
            .unwrap_or([0.0; 4])
    }

    fn float(&self, name: &str) -> f32 {
        self.uniforms.float(name).unwrap_or(0.0)
    }
}

/// Software render backend.
pub struct SoftwareBackend {
    surfaces: HashMap<TextureHandle, Surface>,
    screen: Surface,
    programs: Vec<SoftProgram>,
    bound: Option<TextureHandle>,
    next_handle: u64,
    commands: Vec<Command>,
}

impl SoftwareBackend {
    /// Create a backend whose screen surface has the given resolution.
    pub fn new(screen: Resolution) -> Self {
        Self {
            surfaces: HashMap::new(),
            screen: Surface::new(TargetDesc::new(screen.width, screen.height)),
            programs: Vec::new(),
            bound: None,
            next_handle: 1,
            commands: Vec::new(),
        }
    }

    /// Commands issued since the last call, oldest first.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Number of live render targets.
    pub fn target_count(&self) -> usize {
        self.surfaces.len()
    }

    /// RGBA8 texel of a render target, `None` if the handle or coordinate is invalid.
    pub fn texel(&self, texture: TextureHandle, x: u32, y: u32) -> Option<[u8; 4]> {
        let surface = self.surfaces.get(&texture)?;
        if x >= surface.desc.width || y >= surface.desc.height {
            return None;
        }
        let idx = (y as usize * surface.desc.width as usize + x as usize) * 4;
        surface.pixels[idx..idx + 4].try_into().ok()
    }

    fn surface(&self, texture: TextureHandle) -> Result<&Surface, GpuError> {
        self.surfaces
            .get(&texture)
            .ok_or(GpuError::UnknownTarget(texture))
    }

    fn bound_surface_mut(&mut self) -> Result<&mut Surface, GpuError> {
        match self.bound {
            Some(handle) => self
                .surfaces
                .get_mut(&handle)
                .ok_or(GpuError::UnknownTarget(handle)),
            None => Ok(&mut self.screen),
        }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(Resolution::new(0, 0))
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

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<RenderTarget, GpuError> {
        check_desc(desc)?;

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.surfaces.insert(handle, Surface::new(*desc));

        debug!(
            texture = %handle,
            width = desc.width,
            height = desc.height,
            "Allocated software render target"
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

        let surface = self
            .surfaces
            .get_mut(&target.texture())
            .ok_or(GpuError::UnknownTarget(target.texture()))?;
        *surface = Surface::new(desc);
        target.set_resolution(resolution);
        Ok(())
    }

    fn has_target(&self, texture: TextureHandle) -> bool {
        self.surfaces.contains_key(&texture)
    }

    fn write_target(&mut self, target: &RenderTarget, pixels: &[u8]) -> Result<(), GpuError> {
        let surface = self
            .surfaces
            .get_mut(&target.texture())
            .ok_or(GpuError::UnknownTarget(target.texture()))?;
        if pixels.len() != surface.pixels.len() {
            return Err(GpuError::SizeMismatch {
                expected: surface.pixels.len(),
                got: pixels.len(),
            });
        }
        surface.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn read_target(&mut self, target: &RenderTarget) -> Result<Vec<u8>, GpuError> {
        Ok(self.surface(target.texture())?.pixels.clone())
    }

    fn set_screen_size(&mut self, resolution: Resolution) -> Result<(), GpuError> {
        self.screen = Surface::new(TargetDesc::new(resolution.width, resolution.height));
        Ok(())
    }

    fn screen_size(&self) -> Resolution {
        self.screen.resolution()
    }

    fn read_screen(&mut self) -> Result<Vec<u8>, GpuError> {
        Ok(self.screen.pixels.clone())
    }

    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError> {
        let fragment = source.reference.ok_or_else(|| GpuError::ProgramCompile {
            name: source.name.clone(),
            reason: "no CPU reference fragment".to_string(),
        })?;

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(SoftProgram {
            name: source.name.clone(),
            fragment,
        });

        debug!(program = %source.name, id = %id, "Prepared software program");
        Ok(id)
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        self.bound = target.map(|t| t.texture());
        self.commands.push(Command::Bind(self.bound));
    }

    fn clear(&mut self) -> Result<(), GpuError> {
        let bound = self.bound;
        self.bound_surface_mut()?.pixels.fill(0);
        self.commands.push(Command::Clear(bound));
        Ok(())
    }

    fn draw_fullscreen(&mut self, program: ProgramId, uniforms: &Uniforms) -> Result<(), GpuError> {
        let prog = self
            .programs
            .get(program.0 as usize)
            .ok_or(GpuError::UnknownProgram(program))?;

        let mut textures = Vec::new();
        for (_, value) in uniforms.entries() {
            if let aft_common::UniformValue::Texture(handle) = value {
                self.surface(*handle)?;
                textures.push(*handle);
            }
        }

        let dest = match self.bound {
            Some(handle) => self.surface(handle)?.resolution(),
            None => self.screen.resolution(),
        };

        let mut out = vec![0u8; dest.rgba_byte_size()];
        for y in 0..dest.height {
            for x in 0..dest.width {
                let frag = SoftFragment {
                    uv: [
                        (x as f32 + 0.5) / dest.width as f32,
                        (y as f32 + 0.5) / dest.height as f32,
                    ],
                    dest,
                    uniforms,
                    surfaces: &self.surfaces,
                };
                let color = (prog.fragment)(&frag);
                let idx = (y as usize * dest.width as usize + x as usize) * 4;
                out[idx..idx + 4].copy_from_slice(&pack_rgba8(color));
            }
        }

        self.commands.push(Command::Draw {
            program: prog.name.clone(),
            target: self.bound,
            textures,
        });
        self.bound_surface_mut()?.pixels = out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aft_effects::copy::{OPACITY, T_DIFFUSE};
    use aft_effects::{CopyShader, Effect};

    fn solid(res: Resolution, texel: [u8; 4]) -> Vec<u8> {
        texel.repeat(res.pixel_count() as usize)
    }

    #[test]
    fn create_target_starts_transparent() {
        let mut backend = SoftwareBackend::new(Resolution::new(4, 4));
        let target = backend.create_target(&TargetDesc::new(2, 2)).unwrap();
        assert_eq!(backend.read_target(&target).unwrap(), vec![0u8; 16]);
        assert_eq!(backend.target_count(), 1);
    }

    #[test]
    fn create_target_rejects_empty() {
        let mut backend = SoftwareBackend::default();
        assert!(matches!(
            backend.create_target(&TargetDesc::new(0, 4)),
            Err(GpuError::AllocFailed { .. })
        ));
        assert!(matches!(
            backend.create_target(&TargetDesc::new(4, 0)),
            Err(GpuError::AllocFailed { .. })
        ));
        assert_eq!(backend.target_count(), 0);
    }

    #[test]
    fn has_target_tracks_allocations() {
        let mut backend = SoftwareBackend::default();
        let target = backend.create_target(&TargetDesc::new(2, 2)).unwrap();
        assert!(backend.has_target(target.texture()));
        assert!(!backend.has_target(TextureHandle(target.texture().0 + 1)));
    }

    #[test]
    fn write_target_checks_length() {
        let mut backend = SoftwareBackend::default();
        let target = backend.create_target(&TargetDesc::new(2, 2)).unwrap();
        let err = backend.write_target(&target, &[0u8; 12]).unwrap_err();
        assert!(matches!(
            err,
            GpuError::SizeMismatch {
                expected: 16,
                got: 12
            }
        ));
    }

    #[test]
    fn resize_keeps_handle_and_zeroes() {
        let mut backend = SoftwareBackend::default();
        let mut target = backend.create_target(&TargetDesc::new(2, 2)).unwrap();
        let handle = target.texture();
        backend
            .write_target(&target, &solid(Resolution::new(2, 2), [255; 4]))
            .unwrap();

        backend
            .resize_target(&mut target, Resolution::new(3, 1))
            .unwrap();
        assert_eq!(target.texture(), handle);
        assert_eq!(target.resolution(), Resolution::new(3, 1));
        assert_eq!(backend.read_target(&target).unwrap(), vec![0u8; 12]);
    }

    #[test]
    fn copy_program_to_screen() {
        let mut backend = SoftwareBackend::new(Resolution::new(2, 2));
        let src = backend.create_target(&TargetDesc::new(2, 2)).unwrap();
        let pixels = vec![
            10, 20, 30, 40, 50, 60, 70, 80, //
            90, 100, 110, 120, 130, 140, 150, 160,
        ];
        backend.write_target(&src, &pixels).unwrap();

        let copy = backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
        backend.set_render_target(None);
        backend
            .draw_fullscreen(
                copy,
                &Uniforms::new()
                    .push_f32(OPACITY, 1.0)
                    .push_texture(T_DIFFUSE, src.texture()),
            )
            .unwrap();

        assert_eq!(backend.read_screen().unwrap(), pixels);
        let commands = backend.take_commands();
        assert_eq!(commands[0], Command::Bind(None));
        assert!(matches!(&commands[1], Command::Draw { program, target: None, .. } if program == "copy"));
    }

    #[test]
    fn magnification_is_nearest() {
        let mut backend = SoftwareBackend::default();
        let src = backend.create_target(&TargetDesc::new(2, 1)).unwrap();
        backend
            .write_target(&src, &[0, 0, 0, 255, 255, 255, 255, 255])
            .unwrap();
        let dst = backend.create_target(&TargetDesc::new(4, 1)).unwrap();

        let copy = backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
        backend.set_render_target(Some(&dst));
        backend
            .draw_fullscreen(
                copy,
                &Uniforms::new()
                    .push_f32(OPACITY, 1.0)
                    .push_texture(T_DIFFUSE, src.texture()),
            )
            .unwrap();

        let out = backend.read_target(&dst).unwrap();
        let reds: Vec<u8> = out.chunks(4).map(|p| p[0]).collect();
        assert_eq!(reds, [0, 0, 255, 255]);
    }

    #[test]
    fn minification_is_linear() {
        let mut backend = SoftwareBackend::default();
        let src = backend.create_target(&TargetDesc::new(2, 1)).unwrap();
        backend
            .write_target(&src, &[0, 0, 0, 255, 254, 254, 254, 255])
            .unwrap();
        let dst = backend.create_target(&TargetDesc::new(1, 1)).unwrap();

        let copy = backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
        backend.set_render_target(Some(&dst));
        backend
            .draw_fullscreen(
                copy,
                &Uniforms::new()
                    .push_f32(OPACITY, 1.0)
                    .push_texture(T_DIFFUSE, src.texture()),
            )
            .unwrap();

        // Center of the single output pixel falls halfway between both texels.
        assert_eq!(backend.texel(dst.texture(), 0, 0), Some([127, 127, 127, 255]));
    }

    #[test]
    fn clear_zeroes_bound_target() {
        let mut backend = SoftwareBackend::default();
        let target = backend.create_target(&TargetDesc::new(1, 1)).unwrap();
        backend.write_target(&target, &[9, 9, 9, 9]).unwrap();
        backend.set_render_target(Some(&target));
        backend.clear().unwrap();
        assert_eq!(backend.texel(target.texture(), 0, 0), Some([0, 0, 0, 0]));
        assert_eq!(
            backend.take_commands(),
            vec![
                Command::Bind(Some(target.texture())),
                Command::Clear(Some(target.texture()))
            ]
        );
    }

    #[test]
    fn unknown_program_and_texture_fail() {
        let mut backend = SoftwareBackend::new(Resolution::new(1, 1));
        let err = backend
            .draw_fullscreen(ProgramId(42), &Uniforms::new())
            .unwrap_err();
        assert!(matches!(err, GpuError::UnknownProgram(ProgramId(42))));

        let copy = backend
            .compile_program(&CopyShader::new().program_source())
            .unwrap();
        let err = backend
            .draw_fullscreen(
                copy,
                &Uniforms::new().push_texture(T_DIFFUSE, TextureHandle(999)),
            )
            .unwrap_err();
        assert!(matches!(err, GpuError::UnknownTarget(TextureHandle(999))));
    }

    #[test]
    fn program_without_reference_is_rejected() {
        let mut backend = SoftwareBackend::default();
        let mut src = CopyShader::new().program_source();
        src.reference = None;
        assert!(matches!(
            backend.compile_program(&src),
            Err(GpuError::ProgramCompile { .. })
        ));
    }
}
