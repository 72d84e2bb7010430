mod clock;
mod controller;
mod gpu_context;
mod motion;
mod orchestrator;
mod stage;
mod uniform_stage;

pub use clock::{Cadence, Clock};
pub use controller::{Controller, Key};
pub use gpu_context::GpuContext;
pub use motion::{CameraMotion, CameraUniform, MotionTuning, MAX_TICK_DT};
pub use orchestrator::RenderOrchestrator;
pub use stage::{CameraBinding, RenderStage, StageSequence, TargetSpec, Viewport};
pub use uniform_stage::CameraUniformStage;
