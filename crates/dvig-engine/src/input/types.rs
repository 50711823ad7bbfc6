use std::fmt;

/// Keyboard key identifier.
///
/// The platform layer maps physical key codes into these variants where possible.
/// Anything else arrives as `Key::Unknown` with the platform's numeric code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Events delivered to the application.
///
/// Only presses are reported; releases just update held-key state. Auto-repeat
/// presses are dropped by the platform layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    /// The user asked to close the window.
    Close,
    KeyPressed { key: Key },
}
