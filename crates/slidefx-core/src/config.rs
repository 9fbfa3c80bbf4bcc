use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{EffectKind, SlideError, SlideResult};

/// Whether the slider may use the GPU transition path at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GpuMode {
    /// Use shader transitions when the injected backend reports the required capabilities.
    #[default]
    Auto,
    /// Never touch the GPU; shader effects degrade to the CSS fade.
    Disabled,
}

/// Options recognised at slider construction.
///
/// Millisecond fields take any non-negative number and round it. Each
/// accepts a short alias (`duration`, `interval`); giving both spellings of
/// one field in the same object is rejected as a duplicate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SliderConfig {
    pub animation: EffectKind,
    #[serde(alias = "duration", deserialize_with = "millis")]
    pub duration_ms: u32,
    pub autoplay: bool,
    #[serde(alias = "interval", deserialize_with = "millis")]
    pub interval_ms: u32,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Class toggled on the active slide.
    pub active_class: String,
    pub gpu: GpuMode,
    /// `tracing` filter directive used by the browser log subscriber.
    pub log_level: String,
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "expected a millisecond count, got {value}"
        )));
    }
    Ok(value.round() as u32)
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            animation: EffectKind::Wave,
            duration_ms: 900,
            autoplay: false,
            interval_ms: 4000,
            looping: true,
            active_class: "active".to_string(),
            gpu: GpuMode::Auto,
            log_level: "info".to_string(),
        }
    }
}

impl SliderConfig {
    /// Parse options from JSON. Missing keys fall back to their defaults.
    pub fn from_json(json: &str) -> SlideResult<Self> {
        let config: SliderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SlideResult<()> {
        if self.duration_ms == 0 {
            return Err(SlideError::Config("duration must be greater than 0".into()));
        }
        if self.interval_ms == 0 {
            return Err(SlideError::Config("interval must be greater than 0".into()));
        }
        if self.active_class.trim().is_empty() || self.active_class.contains(char::is_whitespace)
        {
            return Err(SlideError::Config(format!(
                "active class must be a single class name, got {:?}",
                self.active_class
            )));
        }
        Ok(())
    }

    pub fn gpu_allowed(&self) -> bool {
        self.gpu == GpuMode::Auto
    }
}
