//! Deterministic doubles for the DOM, GPU, and frame clock.
//!
//! They record what the engine asks of them and count live resources so
//! tests can assert that every exit path cleans up after itself.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::task::{Poll, Waker};

use async_trait::async_trait;
use futures::future::poll_fn;
use slidefx_core::{Point2D, Rect, SlideError, SlideResult};

use crate::clock::FrameClock;
use crate::dom::{LayoutHost, SlideDom};
use crate::effects::EffectPayload;
use crate::gpu::{Capability, Frame, Gpu, TextureParams, Uniforms};
use crate::overlay::OverlayPlacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Slide,
    Image,
    Canvas,
}

#[derive(Debug, Clone)]
struct NodeState {
    kind: NodeKind,
    rect: Rect,
    border: Point2D,
    parent: Option<NodeId>,
    image: Option<NodeId>,
    positioned: bool,
    hidden: bool,
    active: bool,
    fading: bool,
}

impl NodeState {
    fn new(kind: NodeKind, rect: Rect, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            rect,
            border: Point2D::zero(),
            parent,
            image: None,
            positioned: false,
            hidden: false,
            active: false,
            fading: false,
        }
    }
}

/// A flat in-memory document of slides, their images, and overlay canvases.
pub struct FakeDom {
    nodes: RefCell<BTreeMap<NodeId, NodeState>>,
    next_id: Cell<u32>,
    pixel_ratio: f64,
    fail_insert: Cell<bool>,
    overlays_created: Cell<usize>,
    hide_calls: Cell<usize>,
    fades: RefCell<Vec<(NodeId, NodeId, u32)>>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        Self::with_pixel_ratio(1.0)
    }

    pub fn with_pixel_ratio(pixel_ratio: f64) -> Self {
        Self {
            nodes: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            pixel_ratio,
            fail_insert: Cell::new(false),
            overlays_created: Cell::new(0),
            hide_calls: Cell::new(0),
            fades: RefCell::new(Vec::new()),
        }
    }

    fn alloc(&self, state: NodeState) -> NodeId {
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.nodes.borrow_mut().insert(id, state);
        id
    }

    /// Add a slide laid out at `rect`, optionally holding an image at `image`.
    pub fn add_slide(&self, rect: Rect, image: Option<Rect>) -> NodeId {
        let slide = self.alloc(NodeState::new(NodeKind::Slide, rect, None));
        if let Some(image_rect) = image {
            let img = self.alloc(NodeState::new(NodeKind::Image, image_rect, Some(slide)));
            if let Some(state) = self.nodes.borrow_mut().get_mut(&slide) {
                state.image = Some(img);
            }
        }
        slide
    }

    /// `count` stacked 320x240 slides, each with a full-size image.
    pub fn add_slides(&self, count: usize) -> Vec<NodeId> {
        let rect = Rect::new(0.0, 0.0, 320.0, 240.0);
        (0..count).map(|_| self.add_slide(rect, Some(rect))).collect()
    }

    pub fn image_of(&self, slide: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(&slide).and_then(|s| s.image)
    }

    pub fn set_border(&self, node: NodeId, border: Point2D) {
        if let Some(state) = self.nodes.borrow_mut().get_mut(&node) {
            state.border = border;
        }
    }

    pub fn mark_active(&self, slide: NodeId, active: bool) {
        if let Some(state) = self.nodes.borrow_mut().get_mut(&slide) {
            state.active = active;
        }
    }

    pub fn fail_overlay_insert(&self, fail: bool) {
        self.fail_insert.set(fail);
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.borrow().get(&node).is_some_and(|s| s.hidden)
    }

    pub fn is_fading(&self, node: NodeId) -> bool {
        self.nodes.borrow().get(&node).is_some_and(|s| s.fading)
    }

    pub fn active_slides(&self) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .filter(|(_, s)| s.kind == NodeKind::Slide && s.active)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn live_overlays(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|s| s.kind == NodeKind::Canvas)
            .count()
    }

    pub fn overlays_created(&self) -> usize {
        self.overlays_created.get()
    }

    pub fn overlay_parent(&self, canvas: NodeId) -> Option<NodeId> {
        self.nodes
            .borrow()
            .get(&canvas)
            .filter(|s| s.kind == NodeKind::Canvas)
            .and_then(|s| s.parent)
    }

    pub fn hide_calls(&self) -> usize {
        self.hide_calls.get()
    }

    /// Every `(from, to, duration_ms)` passed to `begin_fade`.
    pub fn fades(&self) -> Vec<(NodeId, NodeId, u32)> {
        self.fades.borrow().clone()
    }

    fn with_node(&self, node: &NodeId, f: impl FnOnce(&mut NodeState)) {
        if let Some(state) = self.nodes.borrow_mut().get_mut(node) {
            f(state);
        }
    }
}

impl LayoutHost for FakeDom {
    type Node = NodeId;

    fn bounding_rect(&self, node: &NodeId) -> SlideResult<Rect> {
        self.nodes
            .borrow()
            .get(node)
            .map(|s| s.rect)
            .ok_or_else(|| SlideError::Layout(format!("{node:?} is not in the document")))
    }

    fn border_offset(&self, node: &NodeId) -> Point2D {
        self.nodes
            .borrow()
            .get(node)
            .map(|s| s.border)
            .unwrap_or_default()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn has_positioning_context(&self, node: &NodeId) -> bool {
        self.nodes.borrow().get(node).is_some_and(|s| s.positioned)
    }

    fn set_relative_positioning(&self, node: &NodeId, enabled: bool) {
        self.with_node(node, |s| s.positioned = enabled);
    }

    fn insert_overlay(&self, container: &NodeId, placement: &OverlayPlacement) -> SlideResult<NodeId> {
        if self.fail_insert.get() {
            return Err(SlideError::Layout("canvas creation refused".into()));
        }
        let container_rect = self.bounding_rect(container)?;
        let rect = Rect::new(
            container_rect.x() + placement.rect.x(),
            container_rect.y() + placement.rect.y(),
            placement.rect.width(),
            placement.rect.height(),
        );
        self.overlays_created.set(self.overlays_created.get() + 1);
        Ok(self.alloc(NodeState::new(NodeKind::Canvas, rect, Some(*container))))
    }

    fn remove_node(&self, node: &NodeId) {
        self.nodes.borrow_mut().remove(node);
    }

    fn set_hidden(&self, node: &NodeId, hidden: bool) {
        if hidden {
            self.hide_calls.set(self.hide_calls.get() + 1);
        }
        self.with_node(node, |s| s.hidden = hidden);
    }
}

impl SlideDom for FakeDom {
    fn eligible_image(&self, slide: &NodeId) -> Option<NodeId> {
        self.image_of(*slide)
    }

    fn is_active(&self, slide: &NodeId) -> bool {
        self.nodes.borrow().get(slide).is_some_and(|s| s.active)
    }

    fn set_active(&self, slide: &NodeId, active: bool) {
        self.mark_active(*slide, active);
    }

    fn begin_fade(&self, from: &NodeId, to: &NodeId, duration_ms: u32) {
        self.fades.borrow_mut().push((*from, *to, duration_ms));
        self.with_node(from, |s| s.fading = true);
        self.with_node(to, |s| s.fading = true);
    }

    fn end_fade(&self, from: &NodeId, to: &NodeId) {
        self.with_node(from, |s| s.fading = false);
        self.with_node(to, |s| s.fading = false);
    }
}

/// Where [`FakeGpu`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Context,
    Geometry,
    Program,
    /// Decoding this image fails with a load error.
    Load(NodeId),
    /// Uploading this image fails with a non-load error.
    LoadLost(NodeId),
    /// The n-th draw call (0-based) fails.
    Draw(usize),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle(pub u32);

/// A GPU that allocates numbered handles and counts the live ones.
pub struct FakeGpu {
    missing: Vec<Capability>,
    fail: Option<FailPoint>,
    next_handle: Cell<u32>,
    live_contexts: Cell<usize>,
    live_geometry: Cell<usize>,
    live_programs: Cell<usize>,
    live_textures: Cell<usize>,
    draw_calls: Cell<usize>,
    draws: RefCell<Vec<Uniforms>>,
    texture_params: RefCell<Vec<TextureParams>>,
    loaded: RefCell<Vec<NodeId>>,
}

impl Default for FakeGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGpu {
    pub fn new() -> Self {
        Self {
            missing: Vec::new(),
            fail: None,
            next_handle: Cell::new(1),
            live_contexts: Cell::new(0),
            live_geometry: Cell::new(0),
            live_programs: Cell::new(0),
            live_textures: Cell::new(0),
            draw_calls: Cell::new(0),
            draws: RefCell::new(Vec::new()),
            texture_params: RefCell::new(Vec::new()),
            loaded: RefCell::new(Vec::new()),
        }
    }

    /// A backend lacking `missing`.
    pub fn without(missing: &[Capability]) -> Self {
        Self {
            missing: missing.to_vec(),
            ..Self::new()
        }
    }

    pub fn failing(fail: FailPoint) -> Self {
        Self {
            fail: Some(fail),
            ..Self::new()
        }
    }

    fn handle(&self, counter: &Cell<usize>) -> FakeHandle {
        counter.set(counter.get() + 1);
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        FakeHandle(id)
    }

    fn fails_at(&self, point: FailPoint) -> bool {
        self.fail == Some(point)
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.get()
    }

    pub fn live_resources(&self) -> usize {
        self.live_contexts.get()
            + self.live_geometry.get()
            + self.live_programs.get()
            + self.live_textures.get()
    }

    /// Uniforms of every successful draw, in order.
    pub fn draws(&self) -> Vec<Uniforms> {
        self.draws.borrow().clone()
    }

    pub fn texture_params(&self) -> Vec<TextureParams> {
        self.texture_params.borrow().clone()
    }

    pub fn loaded_images(&self) -> Vec<NodeId> {
        self.loaded.borrow().clone()
    }
}

fn release(counter: &Cell<usize>) {
    counter.set(counter.get().saturating_sub(1));
}

#[async_trait(?Send)]
impl Gpu for FakeGpu {
    type Node = NodeId;
    type Context = FakeHandle;
    type Geometry = FakeHandle;
    type Program = FakeHandle;
    type Texture = FakeHandle;

    fn supports(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    fn create_context(&self, _canvas: &NodeId, _width: u32, _height: u32) -> SlideResult<FakeHandle> {
        if self.fails_at(FailPoint::Context) {
            return Err(SlideError::GpuUnavailable("context creation failed".into()));
        }
        Ok(self.handle(&self.live_contexts))
    }

    fn create_geometry(&self, _context: &FakeHandle) -> SlideResult<FakeHandle> {
        if self.fails_at(FailPoint::Geometry) {
            return Err(SlideError::Render("buffer allocation failed".into()));
        }
        Ok(self.handle(&self.live_geometry))
    }

    fn compile_program(&self, _context: &FakeHandle, payload: &EffectPayload) -> SlideResult<FakeHandle> {
        if self.fails_at(FailPoint::Program) || payload.fragment.is_empty() {
            return Err(SlideError::Render("shader failed to compile".into()));
        }
        Ok(self.handle(&self.live_programs))
    }

    async fn load_texture(
        &self,
        _context: &FakeHandle,
        image: &NodeId,
        params: TextureParams,
    ) -> SlideResult<FakeHandle> {
        self.texture_params.borrow_mut().push(params);
        self.loaded.borrow_mut().push(*image);
        if self.fails_at(FailPoint::Load(*image)) {
            return Err(SlideError::resource_load(format!("{image:?}"), "decode failed"));
        }
        if self.fails_at(FailPoint::LoadLost(*image)) {
            return Err(SlideError::Render("context lost during upload".into()));
        }
        Ok(self.handle(&self.live_textures))
    }

    fn draw(&self, frame: &Frame<'_, Self>) -> SlideResult<()> {
        let call = self.draw_calls.get();
        self.draw_calls.set(call + 1);
        if self.fails_at(FailPoint::Draw(call)) {
            return Err(SlideError::Render(format!("draw {call} failed")));
        }
        self.draws.borrow_mut().push(frame.uniforms);
        Ok(())
    }

    fn release_texture(&self, _context: &FakeHandle, _texture: FakeHandle) {
        release(&self.live_textures);
    }

    fn release_program(&self, _context: &FakeHandle, _program: FakeHandle) {
        release(&self.live_programs);
    }

    fn release_geometry(&self, _context: &FakeHandle, _geometry: FakeHandle) {
        release(&self.live_geometry);
    }

    fn release_context(&self, _context: FakeHandle) {
        release(&self.live_contexts);
    }
}

/// A manual clock: every frame advances time by the next scripted step.
///
/// While paused, frame and sleep futures stay pending until [`FakeClock::resume`].
pub struct FakeClock {
    now: Cell<f64>,
    default_step: f64,
    steps: RefCell<VecDeque<f64>>,
    frames: Cell<usize>,
    fail_after: Cell<Option<usize>>,
    sleeps: RefCell<Vec<u32>>,
    paused: Cell<bool>,
    waiters: RefCell<Vec<Waker>>,
}

impl FakeClock {
    pub fn new(step_ms: f64) -> Self {
        Self::with_steps(step_ms, Vec::new())
    }

    /// Use `steps` for the first frames, then `default_step` forever.
    pub fn with_steps(default_step: f64, steps: Vec<f64>) -> Self {
        Self {
            now: Cell::new(1000.0),
            default_step,
            steps: RefCell::new(steps.into()),
            frames: Cell::new(0),
            fail_after: Cell::new(None),
            sleeps: RefCell::new(Vec::new()),
            paused: Cell::new(false),
            waiters: RefCell::new(Vec::new()),
        }
    }

    pub fn frames(&self) -> usize {
        self.frames.get()
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }

    /// Let `n` frames through, then fail every later one.
    pub fn fail_frames_after(&self, n: usize) {
        self.fail_after.set(Some(n));
    }

    pub fn pause(&self) {
        self.paused.set(true);
    }

    pub fn resume(&self) {
        self.paused.set(false);
        for waker in self.waiters.borrow_mut().drain(..) {
            waker.wake();
        }
    }

    async fn gate(&self) {
        poll_fn(|cx| {
            if self.paused.get() {
                self.waiters.borrow_mut().push(cx.waker().clone());
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
        .await
    }
}

#[async_trait(?Send)]
impl FrameClock for FakeClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    async fn next_frame(&self) -> SlideResult<f64> {
        self.gate().await;
        if let Some(limit) = self.fail_after.get() {
            if self.frames.get() >= limit {
                return Err(SlideError::Render("animation frame request rejected".into()));
            }
        }
        let step = self.steps.borrow_mut().pop_front().unwrap_or(self.default_step);
        self.now.set(self.now.get() + step);
        self.frames.set(self.frames.get() + 1);
        Ok(self.now.get())
    }

    async fn sleep(&self, ms: u32) {
        self.gate().await;
        self.sleeps.borrow_mut().push(ms);
        self.now.set(self.now.get() + f64::from(ms));
    }
}
