//! DOM collaborator traits.
//!
//! The slider owns no markup. Everything it needs from the document (live
//! measurement, overlay placement, the active flag, the CSS fade) goes
//! through these two traits.

use std::fmt;

use slidefx_core::{Point2D, Rect, SlideResult};

use crate::overlay::OverlayPlacement;

/// Layout access needed to place an overlay over an image.
pub trait LayoutHost {
    /// Handle to an element: slide containers, images, and overlay canvases.
    type Node: Clone + fmt::Debug + 'static;

    /// Rendered border box of `node` in viewport coordinates.
    fn bounding_rect(&self, node: &Self::Node) -> SlideResult<Rect>;

    /// Width of the top/left borders, i.e. where the padding box starts.
    fn border_offset(&self, node: &Self::Node) -> Point2D;

    fn device_pixel_ratio(&self) -> f64;

    /// True if `node` is a containing block for absolutely positioned children.
    fn has_positioning_context(&self, node: &Self::Node) -> bool;

    /// Set (`true`) or clear (`false`) an inline `position: relative`.
    fn set_relative_positioning(&self, node: &Self::Node, enabled: bool);

    /// Create a canvas inside `container` at `placement` and return it.
    fn insert_overlay(
        &self,
        container: &Self::Node,
        placement: &OverlayPlacement,
    ) -> SlideResult<Self::Node>;

    fn remove_node(&self, node: &Self::Node);

    /// Hide or show `node` without affecting layout.
    fn set_hidden(&self, node: &Self::Node, hidden: bool);
}

/// Slide-level bookkeeping used by the controller.
pub trait SlideDom: LayoutHost {
    /// The first direct-child image of `slide`, if any.
    fn eligible_image(&self, slide: &Self::Node) -> Option<Self::Node>;

    fn is_active(&self, slide: &Self::Node) -> bool;

    fn set_active(&self, slide: &Self::Node, active: bool);

    /// Start a CSS opacity cross-fade from `from` to `to` lasting `duration_ms`.
    fn begin_fade(&self, from: &Self::Node, to: &Self::Node, duration_ms: u32);

    /// Clear the inline styles left by [`SlideDom::begin_fade`].
    fn end_fade(&self, from: &Self::Node, to: &Self::Node);
}
