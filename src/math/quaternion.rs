use glam::{Quat, Vec3};

/// Length deviation from 1 beyond which renormalization reports drift.
pub const DRIFT_EPSILON: f32 = 1e-5;

/// Hamilton product `a * b` with `[x, y, z, w]` component order (w scalar).
pub fn multiply(a: Quat, b: Quat) -> Quat {
    Quat::from_xyzw(
        a.x * b.w + a.y * b.z - a.z * b.y + a.w * b.x,
        -a.x * b.z + a.y * b.w + a.z * b.x + a.w * b.y,
        a.x * b.y - a.y * b.x + a.z * b.w + a.w * b.z,
        -a.x * b.x - a.y * b.y - a.z * b.z + a.w * b.w,
    )
}

/// Inverse of a unit quaternion: the conjugate.
pub fn inverse(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.y, -q.z, q.w)
}

/// Raise a unit quaternion to a scalar power.
///
/// `phi = acos(w)` is the half-angle; a zero half-angle yields the identity
/// so the `sin(phi)` divisor never vanishes.
pub fn power(q: Quat, p: f32) -> Quat {
    let phi = q.w.clamp(-1.0, 1.0).acos();
    if phi == 0.0 {
        return Quat::IDENTITY;
    }
    let scaled = phi * p;
    let s = scaled.sin() / phi.sin();
    Quat::from_xyzw(q.x * s, q.y * s, q.z * s, scaled.cos())
}

/// Rotate a vector from camera-local space into world space: `q⁻¹ · [v,0] · q`.
pub fn rotate(v: Vec3, q: Quat) -> Vec3 {
    let pure = Quat::from_xyzw(v.x, v.y, v.z, 0.0);
    let r = multiply(multiply(inverse(q), pure), q);
    Vec3::new(r.x, r.y, r.z)
}

/// Build an incremental rotation from yaw/pitch/roll intents, each scaled by
/// `f` (typically angular rate times tick delta).
pub fn from_intents(yaw: f32, pitch: f32, roll: f32, f: f32) -> Quat {
    let y = yaw * f / 2.0;
    let p = pitch * f / 2.0;
    let r = roll * f / 2.0;
    let (ys, yc) = y.sin_cos();
    let (ps, pc) = p.sin_cos();
    let (rs, rc) = r.sin_cos();

    let psys = ps * ys;
    let psyc = ps * yc;
    let pcys = pc * ys;
    let pcyc = pc * yc;

    Quat::from_xyzw(
        rs * pcys + rc * psyc,
        rs * pcyc - rc * psys,
        rc * pcys + rs * psyc,
        rc * pcyc - rs * psys,
    )
}

/// Rescale to unit length, returning the pre-normalization length alongside
/// so callers can report accumulated numerical drift.
pub fn renormalize(q: Quat) -> (Quat, f32) {
    let len = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
    if len == 1.0 {
        return (q, len);
    }
    (
        Quat::from_xyzw(q.x / len, q.y / len, q.z / len, q.w / len),
        len,
    )
}
