//! # slidefx-core
//!
//! Core types and primitives for the slidefx image slider.
//! This crate contains foundational types shared across all slidefx crates:
//! geometry, transition progress, effect kinds, configuration, and error types.

pub mod config;
pub mod error;
pub mod math;
pub mod time;
pub mod types;

pub use config::{GpuMode, SliderConfig};
pub use error::{SlideError, SlideResult};
pub use math::{Point2D, Rect, Size2D};
pub use time::Progress;
pub use types::EffectKind;
