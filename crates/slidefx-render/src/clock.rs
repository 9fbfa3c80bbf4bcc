use async_trait::async_trait;
use slidefx_core::SlideResult;

/// Source of frame ticks and wall-clock time.
///
/// In the browser this is `requestAnimationFrame` plus `performance.now()`;
/// tests drive it deterministically.
#[async_trait(?Send)]
pub trait FrameClock {
    /// Current monotonic time in milliseconds.
    fn now(&self) -> f64;

    /// Resolve on the next animation frame with that frame's timestamp in
    /// milliseconds, on the same timeline as [`FrameClock::now`].
    async fn next_frame(&self) -> SlideResult<f64>;

    /// Resolve after roughly `ms` milliseconds.
    async fn sleep(&self, ms: u32);
}
