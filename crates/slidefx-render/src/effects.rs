//! Effect registry: shader payloads keyed by [`EffectKind`].
//!
//! Payloads are opaque GLSL ES 1.00 source pairs. Every fragment shader
//! receives the same uniform set (see [`uniforms`]) and samples `tex0`
//! (outgoing image) and `tex1` (incoming image) at `vUv`.

use std::borrow::Cow;
use std::collections::HashMap;

use slidefx_core::EffectKind;

/// Names shared between the shader sources and the backend that binds them.
pub mod uniforms {
    pub const PROGRESS: &str = "progress";
    pub const TIME: &str = "time";
    pub const RESOLUTION: &str = "resolution";
    pub const FROM_TEXTURE: &str = "tex0";
    pub const TO_TEXTURE: &str = "tex1";
    /// Vertex attribute holding the quad corners in clip space.
    pub const POSITION: &str = "position";
}

/// Full-frame quad as a triangle strip.
pub const QUAD_VERTICES: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

pub const VERTEX_SHADER: &str = r#"
attribute vec2 position;
varying vec2 vUv;

void main() {
    vUv = position * 0.5 + 0.5;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

// Shared by every fragment shader: uniforms plus the ease-in-out curve.
const FRAGMENT_PRELUDE: &str = r#"
precision mediump float;

uniform float progress;
uniform float time;
uniform vec2 resolution;
uniform sampler2D tex0;
uniform sampler2D tex1;
varying vec2 vUv;

float easeInOut(float t) {
    return t < 0.5 ? 2.0 * t * t : -1.0 + (4.0 - 2.0 * t) * t;
}
"#;

const WAVE_BODY: &str = r#"
void main() {
    float p = easeInOut(clamp(progress, 0.0, 1.0));

    // Amplitude dies out as the transition settles.
    float amplitude = 0.035 * (1.0 - p);
    float wave = sin(vUv.y * 14.0 + time * 6.0) * amplitude;

    vec4 from = texture2D(tex0, vec2(vUv.x + wave, vUv.y));
    vec4 to = texture2D(tex1, vec2(vUv.x - wave, vUv.y));

    // Soft diagonal wipe: 0 everywhere at p = 0, 1 everywhere at p = 1.
    float edge = (vUv.x + (1.0 - vUv.y)) * 0.5;
    float mask = smoothstep(edge - 0.2, edge + 0.2, p * 1.4 - 0.2);

    gl_FragColor = mix(from, to, mask);
}
"#;

const RIPPLE_BODY: &str = r#"
void main() {
    float p = easeInOut(clamp(progress, 0.0, 1.0));

    vec2 aspect = vec2(resolution.x / max(resolution.y, 1.0), 1.0);
    vec2 delta = (vUv - vec2(0.5)) * aspect;
    float dist = length(delta);
    float reach = length(vec2(0.5) * aspect) + 0.15;
    float radius = p * reach;

    vec2 dir = dist > 0.0 ? delta / dist : vec2(0.0);
    float ripple = sin(dist * 40.0 - p * 24.0) * 0.025 * (1.0 - p);
    vec2 offset = dir * ripple / aspect;

    vec4 from = texture2D(tex0, vUv + offset);
    vec4 to = texture2D(tex1, vUv - offset);

    // 1 once the ring has swept past this pixel.
    float passed = 1.0 - smoothstep(radius - 0.15, radius, dist);
    float mask = max(progress, passed);

    gl_FragColor = mix(from, to, mask);
}
"#;

/// An immutable vertex/fragment source pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectPayload {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl EffectPayload {
    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// A payload using the stock vertex shader and prelude around `body`,
    /// which must define `main()`.
    pub fn from_fragment_body(body: &str) -> Self {
        Self::new(VERTEX_SHADER, format!("{FRAGMENT_PRELUDE}{body}"))
    }
}

/// Lookup table from effect kind to shader payload.
///
/// Built once and handed to the engine; there is no mutation afterwards.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    payloads: HashMap<EffectKind, EffectPayload>,
}

impl EffectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `wave` and `ripple`. `none` never has a payload.
    pub fn builtin() -> Self {
        Self::new()
            .with(EffectKind::Wave, EffectPayload::from_fragment_body(WAVE_BODY))
            .with(EffectKind::Ripple, EffectPayload::from_fragment_body(RIPPLE_BODY))
    }

    /// Register (or replace) the payload for `kind`. Ignored for `EffectKind::None`.
    pub fn with(mut self, kind: EffectKind, payload: EffectPayload) -> Self {
        if kind.uses_gpu() {
            self.payloads.insert(kind, payload);
        }
        self
    }

    pub fn get(&self, kind: EffectKind) -> Option<&EffectPayload> {
        self.payloads.get(&kind)
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.payloads.contains_key(&kind)
    }
}
