use std::sync::Arc;

use anyhow::Result;

use super::gpu_context::GpuContext;

/// Viewport dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What a stage needs to know about the swapchain it will draw into.
#[derive(Debug, Clone, Copy)]
pub struct TargetSpec {
    pub size: Viewport,
    pub format: wgpu::TextureFormat,
}

/// Handle to the camera uniform buffer, handed to content stages at init
/// so their bind groups can read the per-frame snapshot.
#[derive(Clone)]
pub struct CameraBinding {
    buffer: wgpu::Buffer,
}

impl CameraBinding {
    pub fn new(buffer: wgpu::Buffer) -> Self {
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// A unit of per-frame GPU work.
///
/// The orchestrator drives every stage through the same per-frame
/// lifecycle: a sequential `pre_pass` sweep (each stage completing before
/// the next begins), then a `make_pass` sweep recording into one shared
/// command encoder, in sequence order, submitted once.
pub trait RenderStage {
    /// Update internal state for new viewport dimensions; must not block.
    fn on_resize(&mut self, size: Viewport);

    /// One-time setup; may block on resource creation. The uniform stage
    /// receives `None` for the camera binding (it is the producer);
    /// content stages receive `Some`. `clears_target` tells the first
    /// color-writing stage to clear rather than load the swapchain image.
    fn init(
        &mut self,
        gpu: &Arc<GpuContext>,
        camera: Option<&CameraBinding>,
        target: TargetSpec,
        clears_target: bool,
    ) -> Result<()>;

    /// Per-frame preparation; may block (e.g. on a buffer mapping).
    fn pre_pass(&mut self) -> Result<()>;

    /// Record this frame's GPU work into the shared encoder; must not block.
    fn make_pass(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView);
}

/// Ordered render-stage sequence.
///
/// The camera uniform stage is an explicit field rather than position zero
/// of the content list: it always runs first and never writes color, so
/// content stages' draws observe the snapshot copied earlier in the frame.
pub struct StageSequence {
    uniform: Box<dyn RenderStage>,
    content: Vec<Box<dyn RenderStage>>,
}

impl StageSequence {
    pub fn new(uniform: Box<dyn RenderStage>, content: Vec<Box<dyn RenderStage>>) -> Self {
        Self { uniform, content }
    }

    /// One-time init sweep. The uniform stage goes first with no binding
    /// and `clears_target = false` (it records no color output; the flag
    /// is part of the shared signature). Only the first content stage
    /// clears the target; the rest load and draw over it.
    pub fn init_all(
        &mut self,
        gpu: &Arc<GpuContext>,
        camera: &CameraBinding,
        target: TargetSpec,
    ) -> Result<()> {
        self.uniform.init(gpu, None, target, false)?;
        let mut clears_target = true;
        for stage in &mut self.content {
            stage.init(gpu, Some(camera), target, clears_target)?;
            clears_target = false;
        }
        Ok(())
    }

    /// Propagate new dimensions to every stage, uniform stage first.
    pub fn resize_all(&mut self, size: Viewport) {
        self.uniform.on_resize(size);
        for stage in &mut self.content {
            stage.on_resize(size);
        }
    }

    /// Sequential pre-pass sweep; a slow stage delays the whole frame.
    pub fn pre_pass_all(&mut self) -> Result<()> {
        self.uniform.pre_pass()?;
        for stage in &mut self.content {
            stage.pre_pass()?;
        }
        Ok(())
    }

    /// Record every stage's work into the shared encoder, in order.
    pub fn record_all(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        self.uniform.make_pass(encoder, view);
        for stage in &mut self.content {
            stage.make_pass(encoder, view);
        }
    }
}
