//! # slidefx-slider
//!
//! The slide controller: owns the active index, the animating guard, and the
//! autoplay timer, and hands the visual part of each navigation to the
//! transition engine or the CSS fade.

pub mod controller;
pub mod host;

#[cfg(test)]
mod testing;

pub use controller::{Navigation, Slider};
pub use host::Host;
