use futures::future::LocalBoxFuture;
use slidefx_core::SlideResult;
use slidefx_render::FrameClock;

/// Event-loop services the controller needs beyond frame timing.
pub trait Host: FrameClock {
    /// Handle for a repeating timer; passing it back to
    /// [`Host::clear_interval`] stops the timer.
    type Interval;

    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> SlideResult<Self::Interval>;

    fn clear_interval(&self, interval: Self::Interval);

    /// Run `task` to completion on the current thread's executor.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
