use slidefx_core::{SlideError, SlideResult};
use tracing::{debug, instrument, warn};

use crate::clock::FrameClock;
use crate::dom::LayoutHost;
use crate::effects::EffectRegistry;
use crate::gpu::Gpu;
use crate::session::{Tick, TransitionRequest, TransitionSession};

/// Runs shader transitions on an injected graphics backend.
///
/// The engine holds no per-transition state; each [`TransitionEngine::run`]
/// call opens its own session and tears it down before returning.
pub struct TransitionEngine<G: Gpu> {
    gpu: G,
    registry: EffectRegistry,
}

impl<G: Gpu> TransitionEngine<G> {
    /// Engine with the built-in `wave` and `ripple` effects.
    pub fn new(gpu: G) -> Self {
        Self::with_registry(gpu, EffectRegistry::builtin())
    }

    pub fn with_registry(gpu: G, registry: EffectRegistry) -> Self {
        Self { gpu, registry }
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// Fail fast if the backend lacks anything a session needs.
    pub fn check(&self) -> SlideResult<()> {
        let missing = self.gpu.missing_capabilities();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        Err(SlideError::GpuUnavailable(format!(
            "backend is missing: {}",
            names.join(", ")
        )))
    }

    /// Run one transition to completion.
    ///
    /// Resolves once the final frame at progress 1.0 has been drawn and every
    /// resource has been released. On any failure the session is torn down
    /// first, no further frames are requested, and the error is returned for
    /// the caller to fall back on.
    #[instrument(skip_all, fields(effect = %request.effect, duration_ms = request.duration_ms))]
    pub async fn run<L, C>(
        &self,
        layout: &L,
        clock: &C,
        request: &TransitionRequest<L::Node>,
    ) -> SlideResult<()>
    where
        L: LayoutHost,
        G: Gpu<Node = L::Node>,
        C: FrameClock,
    {
        if request.duration_ms == 0 {
            return Err(SlideError::Config("transition duration must be greater than 0".into()));
        }
        let payload = self
            .registry
            .get(request.effect)
            .ok_or_else(|| SlideError::UnknownEffect(request.effect.to_string()))?;
        self.check()?;

        let mut session = TransitionSession::open(&self.gpu, layout, payload, request).await?;
        let start = clock.now();

        loop {
            let timestamp = match clock.next_frame().await {
                Ok(timestamp) => timestamp,
                Err(err) => {
                    warn!(error = %err, "frame scheduling failed");
                    return Err(err);
                }
            };
            match session.tick(timestamp - start) {
                Tick::Continue { .. } => {}
                Tick::Complete => {
                    debug!(frames = session.frames(), "transition complete");
                    return Ok(());
                }
                Tick::Failed(err) => {
                    warn!(error = %err, progress = session.progress(), "transition aborted");
                    return Err(err);
                }
            }
        }
    }
}
