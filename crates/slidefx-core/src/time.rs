use std::fmt;

/// Linear transition progress driven by wall-clock time.
///
/// Progress is derived from elapsed milliseconds over the configured duration,
/// never from frame counts, so a variable frame rate does not change how long
/// a transition takes. The value never decreases, even if the clock does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    value: f32,
    duration_ms: f64,
}

impl Progress {
    /// Start a new clock at zero. `duration_ms` must be positive; callers
    /// validate it before a session is opened.
    pub fn new(duration_ms: f64) -> Self {
        Self {
            value: 0.0,
            duration_ms,
        }
    }

    /// Advance to `elapsed_ms` since the start and return the new value.
    pub fn advance(&mut self, elapsed_ms: f64) -> f32 {
        if !elapsed_ms.is_finite() || self.duration_ms <= 0.0 {
            return self.value;
        }
        let t = (elapsed_ms / self.duration_ms).clamp(0.0, 1.0) as f32;
        self.value = self.value.max(t);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_complete(&self) -> bool {
        self.value >= 1.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.value * 100.0)
    }
}
