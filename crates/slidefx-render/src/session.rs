//! A transition session: the GPU resources and progress state for one
//! navigation's shader effect.
//!
//! The frame loop is modelled as [`TransitionSession::tick`], a plain
//! `elapsed -> Tick` transition function, so it can be driven by
//! `requestAnimationFrame` in the browser or by a synthetic clock in tests.
//! Every resource the session creates is released in `Drop`, in reverse
//! order of creation, and the overlay canvas goes last.

use slidefx_core::{EffectKind, Progress, SlideError, SlideResult};
use tracing::{debug, trace};

use crate::dom::LayoutHost;
use crate::effects::EffectPayload;
use crate::gpu::{Frame, Gpu, Uniforms};
use crate::overlay::OverlaySurface;
use crate::texture;

/// What to transition between.
#[derive(Debug, Clone)]
pub struct TransitionRequest<N> {
    /// Slide that holds `from`; the overlay is placed inside it.
    pub slide: N,
    pub from: N,
    pub to: N,
    pub effect: EffectKind,
    pub duration_ms: u32,
}

/// Outcome of a single frame.
#[derive(Debug)]
pub enum Tick {
    /// Rendered; schedule another frame.
    Continue { progress: f32 },
    /// Rendered the final frame at progress 1.0.
    Complete,
    /// Rendering failed; the session must be torn down.
    Failed(SlideError),
}

pub struct TransitionSession<'a, L, G>
where
    L: LayoutHost,
    G: Gpu<Node = L::Node>,
{
    gpu: &'a G,
    layout: &'a L,
    effect: EffectKind,
    images: [L::Node; 2],
    images_hidden: bool,
    progress: Progress,
    resolution: [f32; 2],
    frames: u32,
    context: Option<G::Context>,
    geometry: Option<G::Geometry>,
    program: Option<G::Program>,
    textures: Option<(G::Texture, G::Texture)>,
    // Declared last so the canvas outlives the context bound to it.
    surface: OverlaySurface<'a, L>,
}

impl<'a, L, G> TransitionSession<'a, L, G>
where
    L: LayoutHost,
    G: Gpu<Node = L::Node>,
{
    /// Acquire the overlay and every GPU resource the effect needs.
    ///
    /// If any step fails, whatever was already created is released before the
    /// error is returned.
    pub async fn open(
        gpu: &'a G,
        layout: &'a L,
        payload: &EffectPayload,
        request: &TransitionRequest<L::Node>,
    ) -> SlideResult<Self> {
        let surface = OverlaySurface::acquire(layout, &request.slide, &request.from)?;
        let placement = *surface.placement();
        let context =
            gpu.create_context(surface.canvas(), placement.pixel_width, placement.pixel_height)?;

        let mut session = Self {
            gpu,
            layout,
            effect: request.effect,
            images: [request.from.clone(), request.to.clone()],
            images_hidden: false,
            progress: Progress::new(f64::from(request.duration_ms)),
            resolution: [placement.pixel_width as f32, placement.pixel_height as f32],
            frames: 0,
            context: Some(context),
            geometry: None,
            program: None,
            textures: None,
            surface,
        };

        session.geometry = Some(gpu.create_geometry(session.context()?)?);
        session.program = Some(gpu.compile_program(session.context()?, payload)?);

        let (from, to) =
            texture::load_pair(gpu, session.context()?, &request.from, &request.to).await;
        session.textures = match (from, to) {
            (Ok(from), Ok(to)) => Some((from, to)),
            (Ok(loaded), Err(err)) | (Err(err), Ok(loaded)) => {
                gpu.release_texture(session.context()?, loaded);
                return Err(err);
            }
            (Err(err), Err(_)) => return Err(err),
        };

        debug!(effect = %session.effect, "session opened");
        Ok(session)
    }

    /// Advance to `elapsed_ms` since the start and draw one frame.
    pub fn tick(&mut self, elapsed_ms: f64) -> Tick {
        let progress = self.progress.advance(elapsed_ms);
        let uniforms = Uniforms {
            progress,
            time: (elapsed_ms.max(0.0) / 1000.0) as f32,
            resolution: self.resolution,
        };

        if let Err(err) = self.draw(uniforms) {
            return Tick::Failed(err);
        }
        self.frames += 1;
        trace!(progress, frame = self.frames, "frame drawn");

        // The canvas shows the blend from the first frame on; hide the
        // originals only once it has something to show.
        if !self.images_hidden {
            for image in &self.images {
                self.layout.set_hidden(image, true);
            }
            self.images_hidden = true;
        }

        if self.progress.is_complete() {
            Tick::Complete
        } else {
            Tick::Continue { progress }
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress.value()
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    fn context(&self) -> SlideResult<&G::Context> {
        self.context
            .as_ref()
            .ok_or_else(|| SlideError::Render("rendering context already released".into()))
    }

    fn draw(&self, uniforms: Uniforms) -> SlideResult<()> {
        let (Some(context), Some(program), Some(geometry), Some((from, to))) = (
            self.context.as_ref(),
            self.program.as_ref(),
            self.geometry.as_ref(),
            self.textures.as_ref(),
        ) else {
            return Err(SlideError::Render("session resources are incomplete".into()));
        };

        self.gpu.draw(&Frame {
            context,
            program,
            geometry,
            from,
            to,
            uniforms,
        })
    }
}

impl<L, G> Drop for TransitionSession<'_, L, G>
where
    L: LayoutHost,
    G: Gpu<Node = L::Node>,
{
    fn drop(&mut self) {
        if self.images_hidden {
            for image in &self.images {
                self.layout.set_hidden(image, false);
            }
        }

        if let Some(context) = self.context.take() {
            if let Some((from, to)) = self.textures.take() {
                self.gpu.release_texture(&context, from);
                self.gpu.release_texture(&context, to);
            }
            if let Some(program) = self.program.take() {
                self.gpu.release_program(&context, program);
            }
            if let Some(geometry) = self.geometry.take() {
                self.gpu.release_geometry(&context, geometry);
            }
            self.gpu.release_context(context);
        }
        debug!(frames = self.frames, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectRegistry;
    use crate::testing::{FailPoint, FakeDom, FakeGpu, NodeId};
    use futures::executor::block_on;
    use slidefx_core::Rect;

    fn setup(dom: &FakeDom) -> TransitionRequest<NodeId> {
        let box_ = Rect::new(0.0, 0.0, 320.0, 240.0);
        let from_slide = dom.add_slide(box_, Some(box_));
        let to_slide = dom.add_slide(box_, Some(box_));
        TransitionRequest {
            slide: from_slide,
            from: dom.image_of(from_slide).unwrap(),
            to: dom.image_of(to_slide).unwrap(),
            effect: EffectKind::Wave,
            duration_ms: 400,
        }
    }

    fn wave() -> EffectPayload {
        EffectRegistry::builtin().get(EffectKind::Wave).cloned().unwrap()
    }

    #[test]
    fn test_tick_progresses_and_completes() {
        let dom = FakeDom::new();
        let gpu = FakeGpu::new();
        let request = setup(&dom);
        let mut session = block_on(TransitionSession::open(&gpu, &dom, &wave(), &request)).unwrap();

        assert!(matches!(session.tick(0.0), Tick::Continue { progress } if progress == 0.0));
        assert!(dom.is_hidden(request.from) && dom.is_hidden(request.to));
        assert!(matches!(session.tick(200.0), Tick::Continue { progress } if (progress - 0.5).abs() < 1e-6));
        assert!(matches!(session.tick(400.0), Tick::Complete));
        assert_eq!(session.frames(), 3);

        let draws = gpu.draws();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[2].progress, 1.0);
        assert!((draws[1].time - 0.2).abs() < 1e-6);
        assert_eq!(draws[0].resolution, [320.0, 240.0]);

        drop(session);
        assert_eq!(gpu.live_resources(), 0);
        assert_eq!(dom.live_overlays(), 0);
        assert!(!dom.is_hidden(request.from) && !dom.is_hidden(request.to));
    }

    #[test]
    fn test_open_failure_releases_partial_resources() {
        for fail in [FailPoint::Context, FailPoint::Geometry, FailPoint::Program] {
            let dom = FakeDom::new();
            let gpu = FakeGpu::failing(fail);
            let request = setup(&dom);

            let result = block_on(TransitionSession::open(&gpu, &dom, &wave(), &request));
            assert!(result.is_err(), "{fail:?} should fail");
            assert_eq!(gpu.live_resources(), 0, "{fail:?} leaked GPU resources");
            assert_eq!(dom.live_overlays(), 0, "{fail:?} leaked the overlay");
        }
    }

    #[test]
    fn test_texture_failure_releases_other_texture() {
        let dom = FakeDom::new();
        let request = setup(&dom);
        let gpu = FakeGpu::failing(FailPoint::Load(request.to));

        let err = block_on(TransitionSession::open(&gpu, &dom, &wave(), &request)).err().unwrap();
        assert!(matches!(err, SlideError::ResourceLoad(_)));
        assert_eq!(gpu.live_resources(), 0);
        assert_eq!(dom.live_overlays(), 0);
    }

    #[test]
    fn test_draw_failure_reports_failed() {
        let dom = FakeDom::new();
        let gpu = FakeGpu::failing(FailPoint::Draw(1));
        let request = setup(&dom);
        let mut session = block_on(TransitionSession::open(&gpu, &dom, &wave(), &request)).unwrap();

        assert!(matches!(session.tick(16.0), Tick::Continue { .. }));
        assert!(matches!(session.tick(32.0), Tick::Failed(SlideError::Render(_))));
        drop(session);
        assert_eq!(gpu.live_resources(), 0);
        assert!(!dom.is_hidden(request.from));
    }

    #[test]
    fn test_first_draw_failure_never_hides_images() {
        let dom = FakeDom::new();
        let gpu = FakeGpu::failing(FailPoint::Draw(0));
        let request = setup(&dom);
        let mut session = block_on(TransitionSession::open(&gpu, &dom, &wave(), &request)).unwrap();

        assert!(matches!(session.tick(0.0), Tick::Failed(_)));
        assert!(!dom.is_hidden(request.from));
        assert_eq!(dom.hide_calls(), 0);
    }
}
