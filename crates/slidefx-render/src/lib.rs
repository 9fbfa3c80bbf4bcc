//! # slidefx-render
//!
//! The slidefx transition engine. Given two slide images it places a canvas
//! over the outgoing image, loads both images as textures, and drives a
//! shader blend between them until progress reaches 1.0, releasing every GPU
//! handle and DOM node it created on the way out.
//!
//! The engine never talks to a browser directly: the DOM, the graphics
//! library, and the frame clock are collaborator traits injected by the host.

pub mod clock;
pub mod dom;
pub mod effects;
pub mod engine;
pub mod gpu;
pub mod overlay;
pub mod session;
pub mod texture;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use clock::FrameClock;
pub use dom::{LayoutHost, SlideDom};
pub use effects::{EffectPayload, EffectRegistry};
pub use engine::TransitionEngine;
pub use gpu::{Capability, Gpu, TextureParams, Uniforms, REQUIRED_CAPABILITIES};
pub use overlay::{OverlayPlacement, OverlaySurface};
pub use session::{Tick, TransitionRequest, TransitionSession};
