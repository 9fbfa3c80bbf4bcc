//! Slide controller.
//!
//! State machine: `Idle -> Animating -> Idle`. A navigation is accepted only
//! from `Idle`; requests that arrive while animating are dropped, not queued.
//! Every accepted navigation ends by updating the index and the active flags
//! together, returning to `Idle`, and firing the change callback once.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use slidefx_core::{SlideError, SlideResult, SliderConfig};
use slidefx_render::{Gpu, SlideDom, TransitionEngine, TransitionRequest};
use tracing::{debug, info, warn};

use crate::host::Host;

/// How a navigation request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Dropped: already animating, same index, out of range, at an edge
    /// with looping off, or the slider was destroyed.
    Ignored,
    /// One of the slides has no eligible image; index swapped instantly.
    Swapped,
    /// CSS opacity fade.
    Faded,
    /// Shader transition on the GPU.
    Rendered,
    /// Shader transition failed; finished with a CSS fade instead.
    Fallback,
}

impl Navigation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Navigation::Ignored => "ignored",
            Navigation::Swapped => "swapped",
            Navigation::Faded => "faded",
            Navigation::Rendered => "rendered",
            Navigation::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Forward,
    Back,
}

#[derive(Debug)]
struct State {
    current: usize,
    animating: bool,
    gpu_enabled: bool,
    destroyed: bool,
}

type ChangeCallback = Rc<dyn Fn(usize, usize)>;

struct Inner<D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    dom: D,
    host: H,
    engine: Option<TransitionEngine<G>>,
    slides: Vec<D::Node>,
    config: SliderConfig,
    state: RefCell<State>,
    autoplay: RefCell<Option<H::Interval>>,
    on_change: RefCell<Option<ChangeCallback>>,
}

impl<D, G, H> Drop for Inner<D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    fn drop(&mut self) {
        if let Some(interval) = self.autoplay.get_mut().take() {
            self.host.clear_interval(interval);
        }
    }
}

/// An image slider over a fixed list of slides.
///
/// Cloning is cheap and yields another handle to the same slider.
pub struct Slider<D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    inner: Rc<Inner<D, G, H>>,
}

impl<D, G, H> Clone for Slider<D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D, G, H> Slider<D, G, H>
where
    D: SlideDom + 'static,
    G: Gpu<Node = D::Node> + 'static,
    H: Host + 'static,
{
    /// Build a slider over `slides`.
    ///
    /// `gpu` is the graphics backend for shader effects; `None` (or
    /// `GpuMode::Disabled` in `config`) leaves only the CSS fade.
    pub fn new(
        dom: D,
        slides: Vec<D::Node>,
        gpu: Option<G>,
        host: H,
        config: SliderConfig,
    ) -> SlideResult<Self> {
        let engine = gpu.map(TransitionEngine::new);
        Self::with_engine(dom, slides, engine, host, config)
    }

    /// Like [`Slider::new`] with a pre-built engine, e.g. one carrying a
    /// custom effect registry.
    pub fn with_engine(
        dom: D,
        slides: Vec<D::Node>,
        engine: Option<TransitionEngine<G>>,
        host: H,
        config: SliderConfig,
    ) -> SlideResult<Self> {
        config.validate()?;
        if slides.is_empty() {
            return Err(SlideError::Config("container has no slides".into()));
        }

        let current = slides.iter().position(|s| dom.is_active(s)).unwrap_or(0);
        for (i, slide) in slides.iter().enumerate() {
            dom.set_active(slide, i == current);
        }

        let engine = if config.gpu_allowed() { engine } else { None };
        let gpu_enabled = engine.is_some();

        info!(
            slides = slides.len(),
            current,
            animation = %config.animation,
            gpu = gpu_enabled,
            "slider ready"
        );

        let autoplay = config.autoplay;
        let slider = Self {
            inner: Rc::new(Inner {
                dom,
                host,
                engine,
                slides,
                config,
                state: RefCell::new(State {
                    current,
                    animating: false,
                    gpu_enabled,
                    destroyed: false,
                }),
                autoplay: RefCell::new(None),
                on_change: RefCell::new(None),
            }),
        };

        if autoplay {
            slider.play()?;
        }
        Ok(slider)
    }

    /// Register the callback fired with `(from, to)` after every completed
    /// navigation. Replaces any previous callback.
    pub fn on_change(&self, callback: impl Fn(usize, usize) + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    pub fn current(&self) -> usize {
        self.inner.state.borrow().current
    }

    pub fn len(&self) -> usize {
        self.inner.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slides.is_empty()
    }

    pub fn is_animating(&self) -> bool {
        self.inner.state.borrow().animating
    }

    pub fn is_playing(&self) -> bool {
        self.inner.autoplay.borrow().is_some()
    }

    /// Whether shader transitions will be attempted.
    pub fn gpu_enabled(&self) -> bool {
        self.inner.state.borrow().gpu_enabled
    }

    pub fn dom(&self) -> &D {
        &self.inner.dom
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn engine(&self) -> Option<&TransitionEngine<G>> {
        self.inner.engine.as_ref()
    }

    pub async fn next(&self) -> Navigation {
        match self.adjacent(Step::Forward) {
            Some(target) => self.show(target).await,
            None => Navigation::Ignored,
        }
    }

    pub async fn prev(&self) -> Navigation {
        match self.adjacent(Step::Back) {
            Some(target) => self.show(target).await,
            None => Navigation::Ignored,
        }
    }

    /// Transition to slide `index`.
    pub async fn show(&self, index: usize) -> Navigation {
        let from = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                debug!(index, "slider destroyed, ignoring navigation");
                return Navigation::Ignored;
            }
            if state.animating {
                debug!(index, "transition in flight, ignoring navigation");
                return Navigation::Ignored;
            }
            if index >= self.inner.slides.len() {
                warn!(index, len = self.inner.slides.len(), "slide index out of range");
                return Navigation::Ignored;
            }
            if index == state.current {
                return Navigation::Ignored;
            }
            state.animating = true;
            state.current
        };

        let mut in_flight = InFlight {
            inner: &self.inner,
            from,
            to: index,
            settled: false,
        };
        let outcome = self.transition(from, index).await;
        in_flight.settled = true;
        self.finish(from, index);
        debug!(from, to = index, outcome = outcome.as_str(), "navigation finished");
        outcome
    }

    /// Start autoplay, replacing any running timer.
    pub fn play(&self) -> SlideResult<()> {
        self.stop();
        if self.inner.state.borrow().destroyed {
            return Ok(());
        }

        let weak = Rc::downgrade(&self.inner);
        let interval = self.inner.host.set_interval(
            self.inner.config.interval_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let slider = Slider { inner };
                let handle = slider.clone();
                let task: LocalBoxFuture<'static, ()> = Box::pin(async move {
                    handle.next().await;
                });
                slider.inner.host.spawn(task);
            }),
        )?;

        *self.inner.autoplay.borrow_mut() = Some(interval);
        debug!(interval_ms = self.inner.config.interval_ms, "autoplay started");
        Ok(())
    }

    /// Stop autoplay. No-op if it is not running.
    pub fn stop(&self) {
        let interval = self.inner.autoplay.borrow_mut().take();
        if let Some(interval) = interval {
            self.inner.host.clear_interval(interval);
            debug!("autoplay stopped");
        }
    }

    /// Stop autoplay and ignore every later navigation. Sessions clean up
    /// after themselves, so there is nothing else to release.
    pub fn destroy(&self) {
        self.stop();
        self.inner.state.borrow_mut().destroyed = true;
        info!("slider destroyed");
    }

    fn adjacent(&self, step: Step) -> Option<usize> {
        let current = self.current();
        let len = self.len();
        let looping = self.inner.config.looping;
        match step {
            Step::Forward if current + 1 < len => Some(current + 1),
            Step::Forward if looping => Some(0),
            Step::Back if current > 0 => Some(current - 1),
            Step::Back if looping => Some(len - 1),
            _ => None,
        }
    }

    async fn transition(&self, from: usize, to: usize) -> Navigation {
        let inner = &*self.inner;
        let from_slide = &inner.slides[from];
        let to_slide = &inner.slides[to];

        let (Some(from_image), Some(to_image)) = (
            inner.dom.eligible_image(from_slide),
            inner.dom.eligible_image(to_slide),
        ) else {
            let missing = if inner.dom.eligible_image(from_slide).is_none() { from } else { to };
            debug!(error = %SlideError::MissingImage { index: missing }, "swapping without transition");
            return Navigation::Swapped;
        };

        // Both slides stay visible so only the images appear to change.
        inner.dom.set_active(from_slide, true);
        inner.dom.set_active(to_slide, true);

        let effect = inner.config.animation;
        let engine = inner.engine.as_ref().filter(|_| self.gpu_enabled());
        let Some(engine) = engine.filter(|_| effect.uses_gpu()) else {
            self.fade(&from_image, &to_image).await;
            return Navigation::Faded;
        };

        let request = TransitionRequest {
            slide: from_slide.clone(),
            from: from_image.clone(),
            to: to_image.clone(),
            effect,
            duration_ms: inner.config.duration_ms,
        };
        match engine.run(&inner.dom, &inner.host, &request).await {
            Ok(()) => Navigation::Rendered,
            Err(err) => {
                warn!(error = %err, from, to, "shader transition failed, falling back to fade");
                if err.is_gpu_unavailable() {
                    inner.state.borrow_mut().gpu_enabled = false;
                    warn!("GPU transitions disabled for this slider");
                }
                self.fade(&from_image, &to_image).await;
                Navigation::Fallback
            }
        }
    }

    async fn fade(&self, from: &D::Node, to: &D::Node) {
        let duration_ms = self.inner.config.duration_ms;
        self.inner.dom.begin_fade(from, to, duration_ms);
        let _fading = Fading {
            dom: &self.inner.dom,
            from,
            to,
        };
        self.inner.host.sleep(duration_ms).await;
    }

    fn finish(&self, from: usize, to: usize) {
        let inner = &*self.inner;
        inner.dom.set_active(&inner.slides[from], false);
        inner.dom.set_active(&inner.slides[to], true);
        {
            let mut state = inner.state.borrow_mut();
            state.current = to;
            state.animating = false;
        }
        info!(from, to, "slide changed");

        let callback = inner.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback(from, to);
        }
    }
}

/// An accepted navigation whose future may be dropped before it finishes.
/// Unless settled, dropping it keeps `from` as the active slide and returns
/// the slider to idle without firing the change callback.
struct InFlight<'s, D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    inner: &'s Inner<D, G, H>,
    from: usize,
    to: usize,
    settled: bool,
}

impl<D, G, H> Drop for InFlight<'_, D, G, H>
where
    D: SlideDom,
    G: Gpu<Node = D::Node>,
    H: Host,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let inner = self.inner;
        inner.dom.set_active(&inner.slides[self.to], false);
        inner.dom.set_active(&inner.slides[self.from], true);
        inner.state.borrow_mut().animating = false;
        warn!(from = self.from, to = self.to, "navigation dropped before completion");
    }
}

/// Ends a CSS fade when it completes or is abandoned.
struct Fading<'s, D: SlideDom> {
    dom: &'s D,
    from: &'s D::Node,
    to: &'s D::Node,
}

impl<D: SlideDom> Drop for Fading<'_, D> {
    fn drop(&mut self) {
        self.dom.end_fade(self.from, self.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use futures::FutureExt;
    use slidefx_core::{EffectKind, GpuMode, Rect};
    use slidefx_render::testing::{FailPoint, FakeDom, FakeGpu, NodeId};
    use slidefx_render::Capability;
    use std::cell::RefCell;

    type TestSlider = Slider<FakeDom, FakeGpu, FakeHost>;

    fn config(animation: EffectKind) -> SliderConfig {
        SliderConfig {
            animation,
            duration_ms: 300,
            ..SliderConfig::default()
        }
    }

    fn build(count: usize, config: SliderConfig, gpu: Option<FakeGpu>) -> (TestSlider, Vec<NodeId>) {
        let dom = FakeDom::new();
        let slides = dom.add_slides(count);
        let slider = Slider::new(dom, slides.clone(), gpu, FakeHost::new(), config).unwrap();
        (slider, slides)
    }

    fn record_changes(slider: &TestSlider) -> Rc<RefCell<Vec<(usize, usize)>>> {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        slider.on_change(move |from, to| sink.borrow_mut().push((from, to)));
        changes
    }

    fn assert_single_active(slider: &TestSlider, slides: &[NodeId]) {
        assert_eq!(slider.dom().active_slides(), vec![slides[slider.current()]]);
    }

    #[test]
    fn test_construction_requires_slides() {
        let err = Slider::<FakeDom, FakeGpu, FakeHost>::new(
            FakeDom::new(),
            Vec::new(),
            None,
            FakeHost::new(),
            SliderConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SlideError::Config(_)));
    }

    #[test]
    fn test_construction_rejects_invalid_config() {
        let dom = FakeDom::new();
        let slides = dom.add_slides(2);
        let bad = SliderConfig {
            duration_ms: 0,
            ..SliderConfig::default()
        };
        assert!(Slider::<_, FakeGpu, _>::new(dom, slides, None, FakeHost::new(), bad).is_err());
    }

    #[test]
    fn test_construction_keeps_marked_active_slide() {
        let dom = FakeDom::new();
        let slides = dom.add_slides(3);
        dom.mark_active(slides[2], true);
        let slider =
            Slider::<_, FakeGpu, _>::new(dom, slides.clone(), None, FakeHost::new(), config(EffectKind::None))
                .unwrap();
        assert_eq!(slider.current(), 2);
        assert_single_active(&slider, &slides);
    }

    #[test]
    fn test_construction_defaults_to_first_slide() {
        let (slider, slides) = build(4, config(EffectKind::None), None);
        assert_eq!(slider.current(), 0);
        assert_single_active(&slider, &slides);
        assert!(!slider.is_animating());
        assert!(!slider.gpu_enabled());
    }

    #[test]
    fn test_fade_scenario() {
        let (slider, slides) = build(3, config(EffectKind::None), Some(FakeGpu::new()));
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.show(1)), Navigation::Faded);

        assert_eq!(slider.current(), 1);
        assert!(!slider.dom().active_slides().contains(&slides[0]));
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        assert_eq!(slider.host().clock().sleeps(), vec![300]);

        let from_image = slider.dom().image_of(slides[0]).unwrap();
        let to_image = slider.dom().image_of(slides[1]).unwrap();
        assert_eq!(slider.dom().fades(), vec![(from_image, to_image, 300)]);
        assert!(!slider.dom().is_fading(from_image) && !slider.dom().is_fading(to_image));
        // `none` never reaches the GPU even when one is available.
        assert!(slider.engine().unwrap().gpu().draws().is_empty());
    }

    #[test]
    fn test_shader_transition_renders() {
        let (slider, slides) = build(3, config(EffectKind::Wave), Some(FakeGpu::new()));
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.next()), Navigation::Rendered);

        assert_eq!(slider.current(), 1);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        let gpu = slider.engine().unwrap().gpu();
        assert_eq!(gpu.draws().last().unwrap().progress, 1.0);
        assert_eq!(gpu.live_resources(), 0);
        assert_eq!(slider.dom().live_overlays(), 0);
        assert!(slider.dom().fades().is_empty());
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        for count in 1..=5 {
            for effect in [EffectKind::None, EffectKind::Ripple] {
                let (slider, _) = build(count, config(effect), Some(FakeGpu::new()));
                for _ in 0..count {
                    block_on(slider.next());
                }
                assert_eq!(slider.current(), 0, "{count} slides, {effect}");
            }
        }
    }

    #[test]
    fn test_prev_then_next_is_identity() {
        let (slider, _) = build(4, config(EffectKind::None), None);
        for start in 0..4 {
            block_on(slider.show(start));
            block_on(slider.prev());
            block_on(slider.next());
            assert_eq!(slider.current(), start);
            block_on(slider.next());
            block_on(slider.prev());
            assert_eq!(slider.current(), start);
        }
    }

    #[test]
    fn test_no_loop_edges_are_noops() {
        let cfg = SliderConfig {
            looping: false,
            ..config(EffectKind::None)
        };
        let (slider, _) = build(2, cfg, None);
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.prev()), Navigation::Ignored);
        assert_eq!(slider.current(), 0);
        assert!(changes.borrow().is_empty());

        block_on(slider.next());
        assert_eq!(block_on(slider.next()), Navigation::Ignored);
        assert_eq!(slider.current(), 1);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_show_while_animating_is_noop() {
        let (slider, _) = build(3, config(EffectKind::Wave), Some(FakeGpu::new()));
        let changes = record_changes(&slider);
        let mut pool = LocalPool::new();

        slider.host().clock().pause();
        let handle = slider.clone();
        pool.spawner()
            .spawn_local(async move {
                handle.show(1).await;
            })
            .unwrap();
        pool.run_until_stalled();

        assert!(slider.is_animating());
        assert_eq!(block_on(slider.show(2)), Navigation::Ignored);
        assert_eq!(block_on(slider.next()), Navigation::Ignored);
        assert_eq!(slider.current(), 0);
        assert!(slider.is_animating());

        slider.host().clock().resume();
        pool.run();
        assert_eq!(slider.current(), 1);
        assert!(!slider.is_animating());
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_same_and_out_of_range_index_ignored() {
        let (slider, _) = build(3, config(EffectKind::None), None);
        let changes = record_changes(&slider);
        assert_eq!(block_on(slider.show(0)), Navigation::Ignored);
        assert_eq!(block_on(slider.show(3)), Navigation::Ignored);
        assert_eq!(slider.current(), 0);
        assert!(!slider.is_animating());
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_missing_image_swaps_without_gpu() {
        let dom = FakeDom::new();
        let rect = Rect::new(0.0, 0.0, 320.0, 240.0);
        let slides = vec![dom.add_slide(rect, Some(rect)), dom.add_slide(rect, None)];
        let slider =
            Slider::new(dom, slides.clone(), Some(FakeGpu::new()), FakeHost::new(), config(EffectKind::Wave))
                .unwrap();
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.show(1)), Navigation::Swapped);

        assert_eq!(slider.current(), 1);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        assert_eq!(slider.dom().overlays_created(), 0);
        assert!(slider.engine().unwrap().gpu().loaded_images().is_empty());
        assert_eq!(slider.host().clock().frames(), 0);
    }

    #[test]
    fn test_gpu_unavailable_falls_back_to_fade() {
        let gpu = FakeGpu::without(&[Capability::RenderContext]);
        let (slider, slides) = build(3, config(EffectKind::Wave), Some(gpu));
        let changes = record_changes(&slider);
        assert!(slider.gpu_enabled());

        assert_eq!(block_on(slider.next()), Navigation::Fallback);

        assert_eq!(slider.current(), 1);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        assert_eq!(slider.dom().fades().len(), 1);
        assert_eq!(slider.dom().overlays_created(), 0);

        // Degraded from here on: straight to the fade.
        assert!(!slider.gpu_enabled());
        assert_eq!(block_on(slider.next()), Navigation::Faded);
    }

    #[test]
    fn test_no_backend_fades() {
        let (slider, slides) = build(2, config(EffectKind::Wave), None);
        let changes = record_changes(&slider);
        assert_eq!(block_on(slider.next()), Navigation::Faded);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_gpu_disabled_by_config() {
        let cfg = SliderConfig {
            gpu: GpuMode::Disabled,
            ..config(EffectKind::Ripple)
        };
        let (slider, _) = build(2, cfg, Some(FakeGpu::new()));
        assert!(slider.engine().is_none());
        assert_eq!(block_on(slider.next()), Navigation::Faded);
    }

    #[test]
    fn test_texture_failure_falls_back_without_leaks() {
        let dom = FakeDom::new();
        let slides = dom.add_slides(2);
        let bad_image = dom.image_of(slides[1]).unwrap();
        let gpu = FakeGpu::failing(FailPoint::Load(bad_image));
        let slider = Slider::new(dom, slides.clone(), Some(gpu), FakeHost::new(), config(EffectKind::Wave)).unwrap();
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.next()), Navigation::Fallback);

        assert_eq!(slider.current(), 1);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        assert_eq!(slider.engine().unwrap().gpu().live_resources(), 0);
        assert_eq!(slider.dom().live_overlays(), 0);
        // A load failure is per-session; the GPU path stays enabled.
        assert!(slider.gpu_enabled());
    }

    #[test]
    fn test_mid_transition_failure_falls_back() {
        let (slider, slides) = build(2, config(EffectKind::Ripple), Some(FakeGpu::failing(FailPoint::Draw(5))));
        let changes = record_changes(&slider);

        assert_eq!(block_on(slider.next()), Navigation::Fallback);
        assert!(!slider.is_animating());
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 1)]);
        let image = slider.dom().image_of(slides[0]).unwrap();
        assert!(!slider.dom().is_hidden(image));
    }

    #[test]
    fn test_play_is_idempotent_and_advances() {
        let (slider, _) = build(3, config(EffectKind::None), None);
        slider.play().unwrap();
        slider.play().unwrap();
        assert!(slider.is_playing());
        assert_eq!(slider.host().active_intervals(), 1);
        assert_eq!(slider.host().interval_periods(), vec![4000]);

        slider.host().fire_intervals();
        assert_eq!(slider.host().run_spawned(), 1);
        assert_eq!(slider.current(), 1);

        slider.stop();
        slider.stop();
        assert!(!slider.is_playing());
        assert_eq!(slider.host().active_intervals(), 0);
    }

    #[test]
    fn test_autoplay_from_config() {
        let cfg = SliderConfig {
            autoplay: true,
            interval_ms: 1500,
            ..config(EffectKind::None)
        };
        let (slider, _) = build(2, cfg, None);
        assert!(slider.is_playing());
        assert_eq!(slider.host().interval_periods(), vec![1500]);
    }

    #[test]
    fn test_destroy_stops_and_ignores() {
        let (slider, _) = build(3, config(EffectKind::None), None);
        slider.play().unwrap();
        slider.destroy();
        assert!(!slider.is_playing());
        assert_eq!(slider.host().active_intervals(), 0);
        assert_eq!(block_on(slider.next()), Navigation::Ignored);
        slider.play().unwrap();
        assert!(!slider.is_playing());
    }

    #[test]
    fn test_callback_sees_settled_state() {
        let (slider, slides) = build(3, config(EffectKind::None), None);
        let handle = slider.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        slider.on_change(move |_, to| {
            sink.borrow_mut().push((handle.current(), handle.is_animating(), to));
        });

        block_on(slider.show(2));
        assert_eq!(*seen.borrow(), vec![(2, false, 2)]);
        assert_single_active(&slider, &slides);
    }

    #[test]
    fn test_dropped_shader_navigation_settles() {
        let (slider, slides) = build(3, config(EffectKind::Wave), Some(FakeGpu::new()));
        let changes = record_changes(&slider);
        slider.host().clock().pause();
        {
            let mut pending = Box::pin(slider.show(1));
            assert!(pending.as_mut().now_or_never().is_none());
            assert!(slider.is_animating());
            assert_eq!(slider.dom().live_overlays(), 1);
        }

        assert!(!slider.is_animating());
        assert_eq!(slider.current(), 0);
        assert_single_active(&slider, &slides);
        assert!(changes.borrow().is_empty());
        assert_eq!(slider.engine().unwrap().gpu().live_resources(), 0);
        assert_eq!(slider.dom().live_overlays(), 0);

        slider.host().clock().resume();
        assert_eq!(block_on(slider.show(2)), Navigation::Rendered);
        assert_eq!(slider.current(), 2);
        assert_single_active(&slider, &slides);
        assert_eq!(*changes.borrow(), vec![(0, 2)]);
    }

    #[test]
    fn test_dropped_fade_ends_the_fade() {
        let (slider, slides) = build(2, config(EffectKind::None), None);
        slider.host().clock().pause();
        {
            let mut pending = Box::pin(slider.next());
            assert!(pending.as_mut().now_or_never().is_none());
        }

        let images: Vec<NodeId> = slides.iter().map(|s| slider.dom().image_of(*s).unwrap()).collect();
        assert_eq!(slider.dom().fades().len(), 1);
        assert!(images.iter().all(|image| !slider.dom().is_fading(*image)));
        assert!(!slider.is_animating());
        assert_single_active(&slider, &slides);

        slider.host().clock().resume();
        assert_eq!(block_on(slider.next()), Navigation::Faded);
        assert_eq!(slider.current(), 1);
    }
}
