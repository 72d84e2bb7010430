use approx::assert_relative_eq;
use lattice_viewer::core::{CameraMotion, Key, MotionTuning, MAX_TICK_DT};

const TICK: f32 = 1.0 / 240.0;

fn motion() -> CameraMotion {
    CameraMotion::new(MotionTuning::default())
}

fn rate_angle(motion: &CameraMotion) -> f32 {
    motion.rotation_rate().w.clamp(-1.0, 1.0).acos()
}

// ============================================================================
// Integrator invariants
// ============================================================================

#[test]
fn orientation_stays_unit_under_arbitrary_input() {
    let mut motion = motion();
    let deltas = [0.002, 0.016, 0.05, 0.1, 0.3];
    let keys = [Key::W, Key::D, Key::Up, Key::Left, Key::R, Key::X];

    for i in 0..600 {
        // Churn the held keys so every axis sees presses and releases
        let key = keys[i % keys.len()];
        motion.controller_mut().set(key, i % 3 != 0, false);

        motion.tick(deltas[i % deltas.len()]);

        let len = motion.rotation().length();
        assert!(
            (len - 1.0).abs() <= 1e-5,
            "orientation drifted to {len} on tick {i}"
        );
        let rate_len = motion.rotation_rate().length();
        assert!((rate_len - 1.0).abs() <= 1e-5);
    }
}

#[test]
fn rates_decay_toward_rest_without_intent() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);
    motion.controller_mut().set(Key::D, true, false);
    for _ in 0..50 {
        motion.tick(TICK);
    }
    motion.controller_mut().set(Key::W, false, false);
    motion.controller_mut().set(Key::D, false, false);

    let mut speed = motion.move_rate().length();
    let mut angle = rate_angle(&motion);
    assert!(speed > 0.0);
    assert!(angle > 0.0);

    for _ in 0..3000 {
        motion.tick(TICK);
        let next_speed = motion.move_rate().length();
        let next_angle = rate_angle(&motion);
        assert!(next_speed <= speed, "speed rose during decay");
        assert!(next_angle <= angle + 1e-6, "spin rose during decay");
        speed = next_speed;
        angle = next_angle;
    }

    // Converging toward rest, not merely shrinking
    assert!(speed < 0.05);
    assert!(angle < 1e-3);
}

#[test]
fn position_freezes_below_move_threshold() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);
    for _ in 0..50 {
        motion.tick(TICK);
    }
    motion.controller_mut().set(Key::W, false, false);

    // Let velocity decay under the hysteresis threshold
    for _ in 0..2000 {
        motion.tick(TICK);
    }
    assert!(motion.move_rate().length() * TICK <= 1e-3);

    let frozen = motion.position();
    for _ in 0..100 {
        motion.tick(TICK);
    }
    assert_eq!(motion.position(), frozen);
}

#[test]
fn orientation_freezes_below_rotation_threshold() {
    let mut motion = motion();
    motion.controller_mut().set(Key::D, true, false);
    for _ in 0..100 {
        motion.tick(TICK);
    }
    motion.controller_mut().set(Key::D, false, false);

    for _ in 0..4000 {
        motion.tick(TICK);
    }
    assert!(rate_angle(&motion) * TICK <= 1e-4);

    // The advance is gated off; only renormalization touches the value,
    // so the orientation holds to within a bit of rounding.
    let frozen = motion.rotation();
    for _ in 0..100 {
        motion.tick(TICK);
    }
    let drift = (motion.rotation() - frozen).length();
    assert!(drift < 1e-6, "orientation kept turning: drift {drift}");
}

// ============================================================================
// Time handling
// ============================================================================

#[test]
fn oversized_delta_is_clamped() {
    let mut a = motion();
    let mut b = motion();
    a.controller_mut().set(Key::W, true, false);
    b.controller_mut().set(Key::W, true, false);
    a.controller_mut().set(Key::Up, true, false);
    b.controller_mut().set(Key::Up, true, false);

    a.tick(5.0);
    b.tick(MAX_TICK_DT);

    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn negative_delta_is_inert() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);

    let before = motion.snapshot();
    motion.tick(-1.0);
    assert_eq!(motion.snapshot(), before);
}

// ============================================================================
// Steady-state travel
// ============================================================================

#[test]
fn forward_intent_moves_along_world_forward() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);

    let start = motion.position();
    for _ in 0..2000 {
        motion.tick(TICK);
    }
    let travelled = motion.position() - start;

    // Identity orientation: world forward is +y, the other axes stay put
    assert!(travelled.y > 0.0);
    assert_relative_eq!(travelled.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(travelled.z, 0.0, epsilon = 1e-4);
}

#[test]
fn forward_speed_approaches_a_fixed_point() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);

    let mut previous = 0.0;
    for _ in 0..2000 {
        motion.tick(TICK);
        let speed = motion.move_rate().length();
        assert!(speed + 1e-4 >= previous, "speed should climb to the limit");
        previous = speed;
    }

    // The decay/accumulation fixed point, dt·linear_rate / (1 - exp(-dt/2)),
    // sits near 40 for these rates; speed must not run away past it.
    assert!(previous > 30.0);
    assert!(previous < 45.0);

    let mut settled = motion.move_rate().length();
    for _ in 0..200 {
        motion.tick(TICK);
        settled = motion.move_rate().length();
    }
    assert_relative_eq!(settled, previous, epsilon = 0.5);
}

// ============================================================================
// Zoom
// ============================================================================

#[test]
fn zoom_grows_shrinks_and_resets() {
    let mut motion = motion();

    motion.controller_mut().set(Key::X, true, false);
    for _ in 0..100 {
        motion.tick(TICK);
    }
    let widened = motion.zoom();
    assert!(widened > 1.0);

    motion.controller_mut().set(Key::X, false, false);
    motion.controller_mut().set(Key::Z, true, false);
    for _ in 0..300 {
        motion.tick(TICK);
    }
    let narrowed = motion.zoom();
    assert!(narrowed < widened);
    assert!(narrowed > 0.0);

    motion.controller_mut().set(Key::Z, false, false);
    motion.controller_mut().set(Key::C, true, false);
    motion.tick(TICK);
    assert_eq!(motion.zoom(), 1.0);
}

#[test]
fn zoom_scales_travel_distance() {
    let mut fast = motion();
    let mut slow = motion();

    // Pre-widen one camera's zoom, then fly both forward identically
    fast.controller_mut().set(Key::X, true, false);
    for _ in 0..200 {
        fast.tick(TICK);
    }
    fast.controller_mut().set(Key::X, false, false);
    assert!(fast.zoom() > 1.0);

    fast.controller_mut().set(Key::W, true, false);
    slow.controller_mut().set(Key::W, true, false);
    let fast_start = fast.position();
    let slow_start = slow.position();
    for _ in 0..500 {
        fast.tick(TICK);
        slow.tick(TICK);
    }

    let fast_travel = (fast.position() - fast_start).length();
    let slow_travel = (slow.position() - slow_start).length();
    assert!(fast_travel > slow_travel);
}

// ============================================================================
// Snapshot semantics
// ============================================================================

#[test]
fn snapshot_is_a_value_copy() {
    let mut motion = motion();
    motion.controller_mut().set(Key::W, true, false);
    motion.tick(TICK);

    let captured = motion.snapshot();
    let saved = captured;

    for _ in 0..50 {
        motion.tick(TICK);
    }

    assert_eq!(captured, saved);
    assert_ne!(motion.snapshot(), saved);
}

#[test]
fn snapshot_mirrors_current_state() {
    let mut motion = motion();
    motion.set_viewport(800.0, 600.0);
    motion.controller_mut().set(Key::W, true, false);
    motion.controller_mut().set(Key::A, true, false);
    for _ in 0..25 {
        motion.tick(TICK);
    }

    let snapshot = motion.snapshot();
    assert_eq!(snapshot.position, motion.position().to_array());
    assert_eq!(snapshot.rotation, motion.rotation().to_array());
    assert_eq!(snapshot.viewport, motion.viewport());
    assert_eq!(snapshot.zoom, motion.zoom());
}
