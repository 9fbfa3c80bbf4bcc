use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use js_sys::{Date, Function, Promise};
use slidefx_core::{SlideError, SlideResult};
use slidefx_render::FrameClock;
use slidefx_slider::Host;
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Performance, Window};

use crate::describe;

/// A running `setInterval` timer and the closure it calls.
pub struct IntervalHandle {
    id: i32,
    _tick: Closure<dyn FnMut()>,
}

/// Browser event loop: `requestAnimationFrame`, timers, and `spawn_local`.
pub struct BrowserHost {
    window: Window,
    performance: Option<Performance>,
}

impl BrowserHost {
    pub fn new() -> SlideResult<Self> {
        let window = web_sys::window().ok_or_else(|| SlideError::Layout("no window".into()))?;
        let performance = window.performance();
        Ok(Self { window, performance })
    }
}

#[async_trait(?Send)]
impl FrameClock for BrowserHost {
    fn now(&self) -> f64 {
        match &self.performance {
            Some(performance) => performance.now(),
            None => Date::now(),
        }
    }

    async fn next_frame(&self) -> SlideResult<f64> {
        let (tx, rx) = oneshot::channel();
        let callback = Closure::once(move |timestamp: f64| {
            let _ = tx.send(timestamp);
        });
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| SlideError::Render(format!("requestAnimationFrame failed: {}", describe(&e))))?;
        // `callback` must outlive the frame.
        let timestamp = rx
            .await
            .map_err(|_| SlideError::Render("animation frame cancelled".into()));
        drop(callback);
        timestamp
    }

    async fn sleep(&self, ms: u32) {
        let window = self.window.clone();
        let delay = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
            if let Err(err) =
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
            {
                warn!(error = %describe(&err), "setTimeout failed");
                let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}

impl Host for BrowserHost {
    type Interval = IntervalHandle;

    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> SlideResult<IntervalHandle> {
        let tick = Closure::wrap(tick);
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                i32::try_from(period_ms).unwrap_or(i32::MAX),
            )
            .map_err(|e| SlideError::Config(format!("setInterval failed: {}", describe(&e))))?;
        Ok(IntervalHandle { id, _tick: tick })
    }

    fn clear_interval(&self, interval: IntervalHandle) {
        self.window.clear_interval_with_handle(interval.id);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
