use std::fmt;

use async_trait::async_trait;
use slidefx_core::SlideResult;

use crate::effects::EffectPayload;

/// A feature the transition engine needs from the graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create a drawing context bound to a canvas.
    RenderContext,
    /// Upload a full-frame quad in clip space.
    FullFrameQuad,
    /// Compile and link a vertex/fragment program with named uniforms.
    ShaderProgram,
    /// Upload a decoded image into a sampleable texture.
    ImageTexture,
    /// Linear min/mag filtering on non-power-of-two textures.
    LinearFiltering,
    /// Explicitly delete every resource above.
    Disposal,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::RenderContext => "render context",
            Capability::FullFrameQuad => "full-frame quad",
            Capability::ShaderProgram => "shader program",
            Capability::ImageTexture => "image texture",
            Capability::LinearFiltering => "linear filtering",
            Capability::Disposal => "resource disposal",
        };
        f.write_str(name)
    }
}

/// Everything a shader transition uses. Checked before any DOM is touched.
pub const REQUIRED_CAPABILITIES: &[Capability] = &[
    Capability::RenderContext,
    Capability::FullFrameQuad,
    Capability::ShaderProgram,
    Capability::ImageTexture,
    Capability::LinearFiltering,
    Capability::Disposal,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Sampling setup for an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    /// Clamp to edge on both axes (required for NPOT textures in WebGL 1).
    pub clamp_to_edge: bool,
    /// Flip rows on upload so image row 0 lands at uv.y = 1.
    pub flip_y: bool,
}

impl TextureParams {
    /// Linear filtering both ways, no mipmaps.
    pub const LINEAR: TextureParams = TextureParams {
        min_filter: Filter::Linear,
        mag_filter: Filter::Linear,
        clamp_to_edge: true,
        flip_y: true,
    };
}

/// Per-frame uniform values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// Linear progress in `[0, 1]`; shaders apply their own easing.
    pub progress: f32,
    /// Seconds since the session started.
    pub time: f32,
    /// Drawing-buffer size in device pixels.
    pub resolution: [f32; 2],
}

/// One draw submission.
pub struct Frame<'a, G: Gpu + ?Sized> {
    pub context: &'a G::Context,
    pub program: &'a G::Program,
    pub geometry: &'a G::Geometry,
    pub from: &'a G::Texture,
    pub to: &'a G::Texture,
    pub uniforms: Uniforms,
}

/// The graphics library, injected at construction.
///
/// Resources are created and released explicitly; a session owns everything
/// it creates and hands each handle back exactly once.
#[async_trait(?Send)]
pub trait Gpu {
    /// Element handle shared with the DOM host (canvases and images).
    type Node: fmt::Debug;
    type Context;
    type Geometry;
    type Program;
    type Texture;

    fn supports(&self, capability: Capability) -> bool;

    /// Required capabilities this backend lacks.
    fn missing_capabilities(&self) -> Vec<Capability> {
        REQUIRED_CAPABILITIES
            .iter()
            .copied()
            .filter(|c| !self.supports(*c))
            .collect()
    }

    /// Bind a context to `canvas` with a drawing buffer of `width` x `height` pixels.
    fn create_context(&self, canvas: &Self::Node, width: u32, height: u32)
        -> SlideResult<Self::Context>;

    fn create_geometry(&self, context: &Self::Context) -> SlideResult<Self::Geometry>;

    fn compile_program(
        &self,
        context: &Self::Context,
        payload: &EffectPayload,
    ) -> SlideResult<Self::Program>;

    /// Decode `image` and upload it. Fails with `SlideError::ResourceLoad`.
    async fn load_texture(
        &self,
        context: &Self::Context,
        image: &Self::Node,
        params: TextureParams,
    ) -> SlideResult<Self::Texture>;

    fn draw(&self, frame: &Frame<'_, Self>) -> SlideResult<()>;

    fn release_texture(&self, context: &Self::Context, texture: Self::Texture);

    fn release_program(&self, context: &Self::Context, program: Self::Program);

    fn release_geometry(&self, context: &Self::Context, geometry: Self::Geometry);

    fn release_context(&self, context: Self::Context);
}
