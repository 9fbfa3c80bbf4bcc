//! # slidefx-wasm
//!
//! Browser binding for slidefx. Exposes `ShaderSlider` to JavaScript and
//! supplies the DOM, WebGL, and event-loop collaborators the engine needs.

pub mod dom;
pub mod host;
pub mod logging;
pub mod webgl;

use js_sys::{Function, Promise, Reflect, JSON};
use slidefx_core::{SlideError, SlideResult, SliderConfig};
use slidefx_slider::Slider;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::Element;

pub use dom::WebDom;
pub use host::BrowserHost;
pub use webgl::WebGl;

type BrowserSlider = Slider<WebDom, WebGl, BrowserHost>;

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn to_js(err: SlideError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Split a JS options object into the slider config and the optional
/// `onChange` function. `undefined` and `null` mean all defaults.
pub fn parse_options(options: &JsValue) -> SlideResult<(SliderConfig, Option<Function>)> {
    if options.is_undefined() || options.is_null() {
        return Ok((SliderConfig::default(), None));
    }
    let on_change = Reflect::get(options, &JsValue::from_str("onChange"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());
    // Functions are dropped by JSON.stringify.
    let json: String = JSON::stringify(options)
        .map_err(|e| SlideError::Config(format!("options are not serializable: {}", describe(&e))))?
        .into();
    let config = SliderConfig::from_json(&json)?;
    Ok((config, on_change))
}

fn resolve_container(dom: &WebDom, container: &JsValue) -> SlideResult<Element> {
    if let Some(selector) = container.as_string() {
        return dom.query(&selector);
    }
    container
        .dyn_ref::<Element>()
        .cloned()
        .ok_or_else(|| SlideError::Config("container must be an element or a selector".into()))
}

#[wasm_bindgen(js_name = ShaderSlider)]
pub struct ShaderSlider {
    inner: BrowserSlider,
}

#[wasm_bindgen(js_class = ShaderSlider)]
impl ShaderSlider {
    /// `new ShaderSlider(container, options)`.
    ///
    /// Throws if the container cannot be resolved, has no slides, or the
    /// options are invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(container: JsValue, options: JsValue) -> Result<ShaderSlider, JsValue> {
        let (config, on_change) = parse_options(&options).map_err(to_js)?;
        logging::init(&config.log_level);

        let dom = WebDom::new(config.active_class.clone()).map_err(to_js)?;
        let container = resolve_container(&dom, &container).map_err(to_js)?;
        let slides = dom.slides(&container);
        let gpu = config
            .gpu_allowed()
            .then(WebGl::probe)
            .filter(WebGl::is_available);
        let host = BrowserHost::new().map_err(to_js)?;

        let inner = Slider::new(dom, slides, gpu, host, config).map_err(to_js)?;
        if let Some(callback) = on_change {
            inner.on_change(move |from, to| {
                let result = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from(from as u32),
                    &JsValue::from(to as u32),
                );
                if let Err(err) = result {
                    warn!(error = %describe(&err), "onChange threw");
                }
            });
        }
        Ok(Self { inner })
    }

    /// Resolves to the navigation outcome: `"ignored"`, `"swapped"`,
    /// `"faded"`, `"rendered"` or `"fallback"`.
    pub fn next(&self) -> Promise {
        let slider = self.inner.clone();
        future_to_promise(async move { Ok(JsValue::from_str(slider.next().await.as_str())) })
    }

    pub fn prev(&self) -> Promise {
        let slider = self.inner.clone();
        future_to_promise(async move { Ok(JsValue::from_str(slider.prev().await.as_str())) })
    }

    pub fn show(&self, index: u32) -> Promise {
        let slider = self.inner.clone();
        future_to_promise(async move {
            Ok(JsValue::from_str(slider.show(index as usize).await.as_str()))
        })
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.inner.play().map_err(to_js)
    }

    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn destroy(&self) {
        self.inner.destroy();
    }

    #[wasm_bindgen(getter)]
    pub fn current(&self) -> u32 {
        self.inner.current() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> u32 {
        self.inner.len() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn animating(&self) -> bool {
        self.inner.is_animating()
    }

    #[wasm_bindgen(getter)]
    pub fn playing(&self) -> bool {
        self.inner.is_playing()
    }

    #[wasm_bindgen(getter, js_name = gpuEnabled)]
    pub fn gpu_enabled(&self) -> bool {
        self.inner.gpu_enabled()
    }
}
