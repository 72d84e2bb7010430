/// Key identifier for the flight controls.
///
/// Winit-independent so controller logic stays testable; the binary maps
/// `winit::keyboard::KeyCode` onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Q,
    W,
    E,
    R,
    A,
    S,
    D,
    F,
    Z,
    X,
    C,
    Up,
    Down,
    Left,
    Right,
}

/// Maps raw key state into signed directional intents.
///
/// Each movement axis is derived from a pair of opposing keys that cancel
/// to zero when both are held. State changes only on true press/release
/// transitions; key-repeat events are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct Controller {
    q: bool,
    w: bool,
    e: bool,
    r: bool,
    a: bool,
    s: bool,
    d: bool,
    f: bool,
    z: bool,
    x: bool,
    c: bool,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release transition for `key`.
    pub fn set(&mut self, key: Key, pressed: bool, repeat: bool) {
        if repeat {
            return;
        }
        match key {
            Key::Q => self.q = pressed,
            Key::W => self.w = pressed,
            Key::E => self.e = pressed,
            Key::R => self.r = pressed,
            Key::A => self.a = pressed,
            Key::S => self.s = pressed,
            Key::D => self.d = pressed,
            Key::F => self.f = pressed,
            Key::Z => self.z = pressed,
            Key::X => self.x = pressed,
            Key::C => self.c = pressed,
            Key::Up => self.up = pressed,
            Key::Down => self.down = pressed,
            Key::Left => self.left = pressed,
            Key::Right => self.right = pressed,
        }
    }

    fn axis(positive: bool, negative: bool) -> f32 {
        match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Strafe axis: E right, Q left.
    pub fn right(&self) -> f32 {
        Self::axis(self.e, self.q)
    }

    /// Travel axis: W forward, S backward.
    pub fn forward(&self) -> f32 {
        Self::axis(self.w, self.s)
    }

    /// Vertical axis: R up, F down.
    pub fn rise(&self) -> f32 {
        Self::axis(self.r, self.f)
    }

    /// Yaw axis: D positive, A negative.
    pub fn yaw(&self) -> f32 {
        Self::axis(self.d, self.a)
    }

    /// Pitch axis: ArrowUp positive, ArrowDown negative.
    pub fn pitch(&self) -> f32 {
        Self::axis(self.up, self.down)
    }

    /// Roll axis: ArrowLeft positive, ArrowRight negative.
    pub fn roll(&self) -> f32 {
        Self::axis(self.left, self.right)
    }

    /// Zoom intent: Z narrows (-1), X widens (+1), each only while the
    /// other and the reset key are up.
    pub fn zoom(&self) -> f32 {
        if self.z && !self.x && !self.c {
            return -1.0;
        }
        if self.x && !self.z && !self.c {
            return 1.0;
        }
        0.0
    }

    /// Zoom reset: C snaps zoom back to 1.
    pub fn zoom_reset(&self) -> bool {
        self.c
    }

    /// Whether any control key is currently held.
    pub fn any_active(&self) -> bool {
        self.q
            || self.w
            || self.e
            || self.r
            || self.a
            || self.s
            || self.d
            || self.f
            || self.z
            || self.x
            || self.c
            || self.up
            || self.down
            || self.left
            || self.right
    }
}
