//! Overlay surface management.
//!
//! A transition draws into a canvas laid exactly over the outgoing image's
//! rendered box. The surface is a scoped resource: it is removed (and any
//! positioning context it had to establish is undone) exactly once, whether
//! the session completes or fails.

use slidefx_core::{Rect, SlideError, SlideResult};
use tracing::debug;

use crate::dom::LayoutHost;

/// Stacking order of the overlay inside its slide: above the image, below
/// captions and controls that use a higher `z-index`.
pub const OVERLAY_Z_INDEX: i32 = 2;

/// Where and how big the overlay canvas is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    /// CSS box relative to the slide's padding box.
    pub rect: Rect,
    /// Drawing-buffer size in device pixels.
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub z_index: i32,
}

/// A canvas placed over an image for the lifetime of one session.
pub struct OverlaySurface<'a, L: LayoutHost> {
    layout: &'a L,
    container: L::Node,
    canvas: L::Node,
    placement: OverlayPlacement,
    established_positioning: bool,
    released: bool,
}

impl<'a, L: LayoutHost> OverlaySurface<'a, L> {
    /// Rendered box of `image` relative to `slide`, from live layout.
    pub fn measure(layout: &L, slide: &L::Node, image: &L::Node) -> SlideResult<Rect> {
        let slide_rect = layout.bounding_rect(slide)?;
        let image_rect = layout.bounding_rect(image)?;
        let rect = image_rect.relative_to(&slide_rect, layout.border_offset(slide));
        if rect.size.is_empty() {
            return Err(SlideError::Layout(format!(
                "image {image:?} has no rendered area ({}x{})",
                rect.width(),
                rect.height()
            )));
        }
        Ok(rect)
    }

    /// Place a canvas over `image` inside `slide`.
    pub fn acquire(layout: &'a L, slide: &L::Node, image: &L::Node) -> SlideResult<Self> {
        let rect = Self::measure(layout, slide, image)?;
        let (pixel_width, pixel_height) = rect.size.to_device_pixels(layout.device_pixel_ratio());
        let placement = OverlayPlacement {
            rect,
            pixel_width,
            pixel_height,
            z_index: OVERLAY_Z_INDEX,
        };

        // Offsets are computed against the padding box, which only holds if
        // the slide is the canvas's containing block.
        let established_positioning = !layout.has_positioning_context(slide);
        if established_positioning {
            layout.set_relative_positioning(slide, true);
        }

        let canvas = match layout.insert_overlay(slide, &placement) {
            Ok(canvas) => canvas,
            Err(err) => {
                if established_positioning {
                    layout.set_relative_positioning(slide, false);
                }
                return Err(err);
            }
        };

        debug!(
            x = rect.x(),
            y = rect.y(),
            width = rect.width(),
            height = rect.height(),
            pixel_width,
            pixel_height,
            "overlay acquired"
        );

        Ok(Self {
            layout,
            container: slide.clone(),
            canvas,
            placement,
            established_positioning,
            released: false,
        })
    }

    pub fn canvas(&self) -> &L::Node {
        &self.canvas
    }

    pub fn placement(&self) -> &OverlayPlacement {
        &self.placement
    }

    /// Remove the canvas now instead of at drop.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.layout.remove_node(&self.canvas);
        if self.established_positioning {
            self.layout.set_relative_positioning(&self.container, false);
        }
        debug!("overlay released");
    }
}

impl<L: LayoutHost> Drop for OverlaySurface<'_, L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDom;
    use slidefx_core::Point2D;

    #[test]
    fn test_acquire_places_canvas_over_image() {
        let dom = FakeDom::with_pixel_ratio(2.0);
        let slide = dom.add_slide(
            Rect::new(10.0, 20.0, 400.0, 300.0),
            Some(Rect::new(30.0, 45.0, 200.0, 150.5)),
        );
        dom.set_border(slide, Point2D::new(1.0, 1.0));
        let image = dom.image_of(slide).unwrap();

        let surface = OverlaySurface::acquire(&dom, &slide, &image).unwrap();
        let placement = *surface.placement();
        assert_eq!(placement.rect, Rect::new(19.0, 24.0, 200.0, 150.5));
        assert_eq!((placement.pixel_width, placement.pixel_height), (400, 301));
        assert_eq!(placement.z_index, OVERLAY_Z_INDEX);
        assert_eq!(dom.live_overlays(), 1);
        assert_eq!(dom.overlay_parent(*surface.canvas()), Some(slide));

        drop(surface);
        assert_eq!(dom.live_overlays(), 0);
    }

    #[test]
    fn test_establishes_and_restores_positioning() {
        let dom = FakeDom::new();
        let slide = dom.add_slide(Rect::new(0.0, 0.0, 100.0, 100.0), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let image = dom.image_of(slide).unwrap();
        assert!(!dom.has_positioning_context(&slide));

        let surface = OverlaySurface::acquire(&dom, &slide, &image).unwrap();
        assert!(dom.has_positioning_context(&slide));
        surface.release();
        assert!(!dom.has_positioning_context(&slide));
        assert_eq!(dom.live_overlays(), 0);
    }

    #[test]
    fn test_keeps_existing_positioning() {
        let dom = FakeDom::new();
        let slide = dom.add_slide(Rect::new(0.0, 0.0, 100.0, 100.0), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        dom.set_relative_positioning(&slide, true);
        let image = dom.image_of(slide).unwrap();

        drop(OverlaySurface::acquire(&dom, &slide, &image).unwrap());
        assert!(dom.has_positioning_context(&slide));
    }

    #[test]
    fn test_zero_area_image_is_layout_error() {
        let dom = FakeDom::new();
        let slide = dom.add_slide(Rect::new(0.0, 0.0, 100.0, 100.0), Some(Rect::new(0.0, 0.0, 0.0, 80.0)));
        let image = dom.image_of(slide).unwrap();

        let err = OverlaySurface::acquire(&dom, &slide, &image).err().unwrap();
        assert!(matches!(err, SlideError::Layout(_)));
        assert_eq!(dom.live_overlays(), 0);
        assert!(!dom.has_positioning_context(&slide));
    }

    #[test]
    fn test_insert_failure_restores_positioning() {
        let dom = FakeDom::new();
        let slide = dom.add_slide(Rect::new(0.0, 0.0, 100.0, 100.0), Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let image = dom.image_of(slide).unwrap();
        dom.fail_overlay_insert(true);

        assert!(OverlaySurface::acquire(&dom, &slide, &image).is_err());
        assert!(!dom.has_positioning_context(&slide));
    }
}
