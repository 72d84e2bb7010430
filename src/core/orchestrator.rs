use std::sync::Arc;

use anyhow::Result;

use super::gpu_context::GpuContext;
use super::stage::{CameraBinding, StageSequence, TargetSpec, Viewport};

/// Drives the per-frame stage lifecycle against one swapchain.
///
/// Owns the surface and the stage sequence. Each frame runs every stage's
/// `pre_pass` in order (each completing before the next starts), acquires
/// one command encoder and one swapchain view, has every stage record into
/// them in the same order, submits once and presents. The running flag only
/// gates whether the caller keeps scheduling frames; an in-flight frame
/// always completes.
pub struct RenderOrchestrator {
    gpu: Arc<GpuContext>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    sequence: StageSequence,
    running: bool,
}

impl RenderOrchestrator {
    /// Configure the surface and run one-time init over the sequence.
    /// Any stage init failure is fatal and propagates.
    pub fn new(
        gpu: Arc<GpuContext>,
        surface: wgpu::Surface<'static>,
        size: Viewport,
        mut sequence: StageSequence,
        camera: CameraBinding,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(gpu.adapter());
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        sequence.init_all(&gpu, &camera, TargetSpec { size, format })?;

        Ok(Self {
            gpu,
            surface,
            surface_config,
            sequence,
            running: false,
        })
    }

    /// Allow frame scheduling.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop scheduling new frames; a frame already underway still completes.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one frame: pre-pass sweep, record sweep into a single encoder,
    /// one submit, present. A lost or outdated surface reconfigures and
    /// drops the frame; the next one re-acquires cleanly.
    pub fn render_frame(&mut self) -> Result<()> {
        self.sequence.pre_pass_all()?;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(self.gpu.device(), &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, dropping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.sequence.record_all(&mut encoder, &view);

        self.gpu.queue().submit(Some(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// Apply new surface dimensions and propagate them to every stage
    /// before the next frame runs. Zero-sized updates are ignored.
    pub fn resize(&mut self, size: Viewport) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        log::debug!("resize to {}x{}", size.width, size.height);
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(self.gpu.device(), &self.surface_config);

        self.sequence.resize_all(size);
    }
}
