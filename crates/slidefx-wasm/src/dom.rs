use slidefx_core::{Point2D, Rect, SlideError, SlideResult};
use slidefx_render::{LayoutHost, OverlayPlacement, SlideDom};
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, Document, Element, HtmlCanvasElement, HtmlElement, Window};

use crate::describe;

/// Layout and slide bookkeeping over the live document.
pub struct WebDom {
    window: Window,
    document: Document,
    active_class: String,
}

impl WebDom {
    pub fn new(active_class: impl Into<String>) -> SlideResult<Self> {
        let window = web_sys::window().ok_or_else(|| SlideError::Layout("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| SlideError::Layout("no document".into()))?;
        Ok(Self {
            window,
            document,
            active_class: active_class.into(),
        })
    }

    /// Resolve a selector to its first matching element.
    pub fn query(&self, selector: &str) -> SlideResult<Element> {
        self.document
            .query_selector(selector)
            .map_err(|e| SlideError::Config(format!("invalid selector {selector:?}: {}", describe(&e))))?
            .ok_or_else(|| SlideError::Config(format!("no element matches {selector:?}")))
    }

    /// The container's direct element children, in document order.
    pub fn slides(&self, container: &Element) -> Vec<Element> {
        let children = container.children();
        (0..children.length()).filter_map(|i| children.item(i)).collect()
    }

    fn computed(&self, node: &Element) -> Option<CssStyleDeclaration> {
        self.window.get_computed_style(node).ok().flatten()
    }

    fn computed_px(&self, node: &Element, property: &str) -> f64 {
        self.computed(node)
            .and_then(|style| style.get_property_value(property).ok())
            .and_then(|value| value.trim().trim_end_matches("px").parse().ok())
            .unwrap_or(0.0)
    }
}

fn style(node: &Element) -> Option<CssStyleDeclaration> {
    node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

fn set_style(node: &Element, property: &str, value: &str) {
    if let Some(style) = style(node) {
        if let Err(err) = style.set_property(property, value) {
            debug!(property, error = %describe(&err), "style update rejected");
        }
    }
}

fn clear_style(node: &Element, property: &str) {
    if let Some(style) = style(node) {
        let _ = style.remove_property(property);
    }
}

impl LayoutHost for WebDom {
    type Node = Element;

    fn bounding_rect(&self, node: &Element) -> SlideResult<Rect> {
        let r = node.get_bounding_client_rect();
        Ok(Rect::new(r.left(), r.top(), r.width(), r.height()))
    }

    fn border_offset(&self, node: &Element) -> Point2D {
        Point2D::new(
            self.computed_px(node, "border-left-width"),
            self.computed_px(node, "border-top-width"),
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn has_positioning_context(&self, node: &Element) -> bool {
        self.computed(node)
            .and_then(|style| style.get_property_value("position").ok())
            .is_some_and(|position| !position.is_empty() && position != "static")
    }

    fn set_relative_positioning(&self, node: &Element, enabled: bool) {
        if enabled {
            set_style(node, "position", "relative");
        } else {
            clear_style(node, "position");
        }
    }

    fn insert_overlay(&self, container: &Element, placement: &OverlayPlacement) -> SlideResult<Element> {
        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(Into::into))
            .map_err(|e| SlideError::Layout(format!("canvas creation failed: {}", describe(&e))))?;
        canvas.set_width(placement.pixel_width);
        canvas.set_height(placement.pixel_height);

        let element: Element = canvas.into();
        let rect = placement.rect;
        for (property, value) in [
            ("position", "absolute".to_string()),
            ("left", format!("{}px", rect.x())),
            ("top", format!("{}px", rect.y())),
            ("width", format!("{}px", rect.width())),
            ("height", format!("{}px", rect.height())),
            ("z-index", placement.z_index.to_string()),
            ("pointer-events", "none".to_string()),
        ] {
            set_style(&element, property, &value);
        }

        container
            .append_child(&element)
            .map_err(|e| SlideError::Layout(format!("overlay insert failed: {}", describe(&e))))?;
        Ok(element)
    }

    fn remove_node(&self, node: &Element) {
        node.remove();
    }

    fn set_hidden(&self, node: &Element, hidden: bool) {
        if hidden {
            set_style(node, "visibility", "hidden");
        } else {
            clear_style(node, "visibility");
        }
    }
}

impl SlideDom for WebDom {
    fn eligible_image(&self, slide: &Element) -> Option<Element> {
        let children = slide.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .find(|child| child.tag_name().eq_ignore_ascii_case("img"))
    }

    fn is_active(&self, slide: &Element) -> bool {
        slide.class_list().contains(&self.active_class)
    }

    fn set_active(&self, slide: &Element, active: bool) {
        if let Err(err) = slide.class_list().toggle_with_force(&self.active_class, active) {
            debug!(error = %describe(&err), "class toggle rejected");
        }
    }

    fn begin_fade(&self, from: &Element, to: &Element, duration_ms: u32) {
        let transition = format!("opacity {duration_ms}ms ease");
        set_style(from, "transition", &transition);
        set_style(to, "transition", &transition);
        set_style(to, "opacity", "0");
        // Flush layout so the incoming image starts from 0.
        let _ = to.get_bounding_client_rect();
        set_style(from, "opacity", "0");
        set_style(to, "opacity", "1");
    }

    fn end_fade(&self, from: &Element, to: &Element) {
        for node in [from, to] {
            clear_style(node, "transition");
            clear_style(node, "opacity");
        }
    }
}
