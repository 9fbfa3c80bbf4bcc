use serde::{Deserialize, Serialize};

/// The visual effect used when moving from one slide to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Horizontal wave distortion with a soft diagonal wipe.
    #[default]
    Wave,
    /// Expanding radial ring that reveals the next image.
    Ripple,
    /// Plain CSS opacity fade, no GPU involved.
    None,
}

impl EffectKind {
    /// Whether this effect needs a shader program.
    pub fn uses_gpu(&self) -> bool {
        !matches!(self, EffectKind::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Wave => "wave",
            EffectKind::Ripple => "ripple",
            EffectKind::None => "none",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
