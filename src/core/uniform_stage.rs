use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{mpsc, Arc};

use anyhow::Result;

use super::gpu_context::GpuContext;
use super::motion::{CameraMotion, CameraUniform};
use super::stage::{CameraBinding, RenderStage, TargetSpec, Viewport};

const SNAPSHOT_SIZE: u64 = std::mem::size_of::<CameraUniform>() as u64;

/// Uploads the camera snapshot to the GPU once per frame.
///
/// Two buffers: a GPU-resident uniform buffer read by every content
/// stage's draws, and a CPU-writable staging buffer. The uniform buffer
/// cannot be written while the GPU may read it, so each frame writes the
/// snapshot into the mapped staging buffer and records a buffer-to-buffer
/// copy into the shared encoder, ahead of every draw recorded later in
/// the same frame.
pub struct CameraUniformStage {
    motion: Rc<RefCell<CameraMotion>>,
    gpu: Arc<GpuContext>,
    uniform_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    staging_mapped: bool,
}

impl CameraUniformStage {
    /// Create the stage and both buffers. The uniform buffer starts
    /// mapped so `init` can seed it before the first frame.
    pub fn new(gpu: Arc<GpuContext>, motion: Rc<RefCell<CameraMotion>>) -> Self {
        let uniform_buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: SNAPSHOT_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        let staging_buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Staging Buffer"),
            size: SNAPSHOT_SIZE,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        Self {
            motion,
            gpu,
            uniform_buffer,
            staging_buffer,
            staging_mapped: false,
        }
    }

    /// Handle for content stages to bind the per-frame camera snapshot.
    pub fn binding(&self) -> CameraBinding {
        CameraBinding::new(self.uniform_buffer.clone())
    }
}

impl RenderStage for CameraUniformStage {
    fn on_resize(&mut self, size: Viewport) {
        self.motion
            .borrow_mut()
            .set_viewport(size.width as f32, size.height as f32);
    }

    fn init(
        &mut self,
        _gpu: &Arc<GpuContext>,
        _camera: Option<&CameraBinding>,
        target: TargetSpec,
        _clears_target: bool,
    ) -> Result<()> {
        self.motion
            .borrow_mut()
            .set_viewport(target.size.width as f32, target.size.height as f32);

        // Seed the uniform buffer so the first frame's draws read a valid
        // snapshot even before the first staging copy lands.
        let snapshot = self.motion.borrow().snapshot();
        {
            let mut mapped = self.uniform_buffer.slice(..).get_mapped_range_mut();
            mapped.copy_from_slice(bytemuck::bytes_of(&snapshot));
        }
        self.uniform_buffer.unmap();

        self.motion.borrow_mut().start();
        Ok(())
    }

    /// Request a write mapping of the staging buffer and block until the
    /// GPU has released it; a new mapping is never requested while an
    /// earlier copy from this buffer is still in flight.
    fn pre_pass(&mut self) -> Result<()> {
        // Still mapped from a frame that was dropped before recording;
        // the pending write is simply reused.
        if self.staging_mapped {
            return Ok(());
        }

        let (sender, receiver) = mpsc::channel();
        self.staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Write, move |result| {
                sender.send(result).ok();
            });

        self.gpu.device().poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;

        receiver.recv()??;
        self.staging_mapped = true;
        Ok(())
    }

    /// Write this frame's snapshot into the mapped staging memory, unmap,
    /// and enqueue the copy into the uniform buffer. Records no color
    /// output; the target view goes unused.
    fn make_pass(&mut self, encoder: &mut wgpu::CommandEncoder, _view: &wgpu::TextureView) {
        let snapshot = self.motion.borrow().snapshot();
        {
            let mut mapped = self.staging_buffer.slice(..).get_mapped_range_mut();
            mapped.copy_from_slice(bytemuck::bytes_of(&snapshot));
        }
        self.staging_buffer.unmap();
        self.staging_mapped = false;

        encoder.copy_buffer_to_buffer(&self.staging_buffer, 0, &self.uniform_buffer, 0, SNAPSHOT_SIZE);
    }
}
