use glam::{Quat, Vec3};

use crate::math::quaternion;

use super::clock::{Cadence, Clock};
use super::controller::Controller;

/// Upper bound on a single tick's elapsed-time input, in seconds. Bounds
/// integration error after a long stall (window hidden, debugger pause).
pub const MAX_TICK_DT: f32 = 0.1;

/// Empirically tuned motion constants.
///
/// The hysteresis thresholds suppress sub-perceptible position and
/// orientation updates; they are configuration, not derived quantities.
#[derive(Debug, Clone, Copy)]
pub struct MotionTuning {
    /// Acceleration applied per unit of translation intent.
    pub linear_rate: f32,
    /// Angular impulse applied per unit of rotation intent.
    pub angular_rate: f32,
    /// Minimum per-tick displacement magnitude that moves the camera.
    pub min_move: f32,
    /// Minimum per-tick rotation angle that turns the camera.
    pub min_rotation: f32,
    /// Physics tick frequency, decoupled from display refresh.
    pub tick_hz: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            linear_rate: 20.0,
            angular_rate: 1.0,
            min_move: 1e-3,
            min_rotation: 1e-4,
            tick_hz: 240.0,
        }
    }
}

/// Per-frame camera snapshot, mirrored bit-exactly into the GPU uniform
/// buffer. 16 floats, 64 bytes; the trailing lanes are reserved padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub position: [f32; 3],
    _pad0: f32,
    pub rotation: [f32; 4],
    pub viewport: [f32; 2],
    pub zoom: f32,
    _pad1: f32,
    _pad2: [f32; 4],
}

/// Continuous-time camera integrator.
///
/// Turns the controller's discrete intents into damped translation,
/// quaternion rotation and exponential zoom. Runs as its own schedule:
/// `pump` is called every event-loop turn and fires at most one `tick`
/// per call once the configured cadence interval has elapsed, so ticks
/// never overlap and always integrate over real elapsed time.
#[derive(Debug)]
pub struct CameraMotion {
    controller: Controller,
    tuning: MotionTuning,
    position: Vec3,
    rotation: Quat,
    rotation_rate: Quat,
    move_rate: Vec3,
    zoom: f32,
    viewport: [f32; 2],
    running: bool,
    clock: Clock,
    cadence: Cadence,
}

impl CameraMotion {
    pub fn new(tuning: MotionTuning) -> Self {
        Self {
            controller: Controller::new(),
            position: Vec3::new(0.0, -5.0, 0.0),
            rotation: Quat::IDENTITY,
            rotation_rate: Quat::IDENTITY,
            move_rate: Vec3::ZERO,
            zoom: 1.0,
            viewport: [1.0, 1.0],
            running: false,
            clock: Clock::new(),
            cadence: Cadence::new(tuning.tick_hz),
            tuning,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Enter the Running state; the next `pump` begins measuring from now.
    pub fn start(&mut self) {
        self.running = true;
        self.clock.reset();
        self.cadence.reset();
    }

    /// Return to Idle, cancelling the pending tick.
    pub fn stop(&mut self) {
        self.running = false;
        self.cadence.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Event-loop step function: advances the schedule and fires at most
    /// one tick when the cadence interval has elapsed.
    pub fn pump(&mut self) {
        if !self.running {
            return;
        }
        let delta = self.clock.tick();
        if let Some(elapsed) = self.cadence.fire(delta) {
            self.tick(elapsed);
        }
    }

    /// Advance the motion state by one tick of `raw_dt` seconds (clamped
    /// to [`MAX_TICK_DT`]).
    pub fn tick(&mut self, raw_dt: f32) {
        let dt = raw_dt.clamp(0.0, MAX_TICK_DT);

        let dx = dt * self.tuning.linear_rate;
        let da = dt * self.tuning.angular_rate;

        // Exponential damping toward rest; the angular rate decays toward
        // identity through a fractional quaternion power.
        let damping = (-dt / 2.0).exp();
        self.move_rate *= damping;
        self.rotation_rate = quaternion::power(self.rotation_rate, (-dt).exp());

        let intent = Vec3::new(
            self.controller.right(),
            self.controller.forward(),
            self.controller.rise(),
        );
        let spin = quaternion::from_intents(
            self.controller.yaw(),
            self.controller.pitch(),
            self.controller.roll(),
            da,
        );

        self.rotation_rate = quaternion::multiply(spin, self.rotation_rate);

        // Translation intent is expressed in camera-local axes; conjugate
        // it into world space before accumulating.
        let world_intent = quaternion::rotate(intent, self.rotation);
        self.move_rate += world_intent * dx;

        if self.move_rate.length() * dt > self.tuning.min_move {
            self.position += self.move_rate * (dt * self.zoom);
        }
        let rate_angle = self.rotation_rate.w.clamp(-1.0, 1.0).acos().abs();
        if rate_angle * dt > self.tuning.min_rotation {
            let step = quaternion::power(self.rotation_rate, dt * self.zoom.min(1.0));
            self.rotation = quaternion::multiply(step, self.rotation);
        }

        self.rotation_rate = renormalize_checked(self.rotation_rate, "angular rate");
        self.rotation = renormalize_checked(self.rotation, "orientation");

        if self.controller.zoom_reset() {
            self.zoom = 1.0;
        } else {
            self.zoom += self.zoom * self.controller.zoom() * dt;
        }
    }

    /// Record new viewport dimensions. Both aspect components are the
    /// dimension divided by the smaller one, so the smaller equals 1.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let min = width.min(height);
        self.viewport = [width / min, height / min];
    }

    /// Capture the current state as a GPU-ready value. A pure copy:
    /// later ticks leave the returned snapshot untouched.
    pub fn snapshot(&self) -> CameraUniform {
        CameraUniform {
            position: self.position.to_array(),
            _pad0: 0.0,
            rotation: self.rotation.to_array(),
            viewport: self.viewport,
            zoom: self.zoom,
            _pad1: 0.0,
            _pad2: [0.0; 4],
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn move_rate(&self) -> Vec3 {
        self.move_rate
    }

    pub fn rotation_rate(&self) -> Quat {
        self.rotation_rate
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> [f32; 2] {
        self.viewport
    }
}

fn renormalize_checked(q: Quat, what: &str) -> Quat {
    let (unit, len) = quaternion::renormalize(q);
    if (len - 1.0).abs() > quaternion::DRIFT_EPSILON {
        log::warn!("{what} quaternion drifted to length {len}");
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::controller::Key;

    #[test]
    fn snapshot_is_64_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn viewport_pair_is_min_normalized() {
        let mut motion = CameraMotion::new(MotionTuning::default());

        motion.set_viewport(800.0, 600.0);
        assert_eq!(motion.viewport(), [800.0 / 600.0, 1.0]);

        motion.set_viewport(600.0, 800.0);
        assert_eq!(motion.viewport(), [1.0, 800.0 / 600.0]);
    }

    #[test]
    fn pump_does_nothing_while_idle() {
        let mut motion = CameraMotion::new(MotionTuning::default());
        motion.controller_mut().set(Key::W, true, false);

        let before = motion.snapshot();
        motion.pump();
        assert_eq!(motion.snapshot(), before);
    }

    #[test]
    fn start_and_stop_toggle_running() {
        let mut motion = CameraMotion::new(MotionTuning::default());
        assert!(!motion.is_running());
        motion.start();
        assert!(motion.is_running());
        motion.stop();
        assert!(!motion.is_running());
    }
}
