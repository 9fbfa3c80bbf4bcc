//! WebGL 1 backend for the transition engine.

use async_trait::async_trait;
use js_sys::Float32Array;
use slidefx_core::{SlideError, SlideResult};
use slidefx_render::effects::{uniforms, QUAD_VERTICES};
use slidefx_render::gpu::Filter;
use slidefx_render::{Capability, EffectPayload, Gpu, TextureParams};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Element, HtmlCanvasElement, HtmlImageElement, WebGlBuffer, WebGlProgram,
    WebGlRenderingContext as GL, WebGlShader, WebGlTexture, WebGlUniformLocation, WebglLoseContext,
};

use crate::describe;

pub struct GlContext {
    gl: GL,
}

pub struct GlProgram {
    program: WebGlProgram,
    shaders: [WebGlShader; 2],
    position: u32,
    progress: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    resolution: Option<WebGlUniformLocation>,
    from: Option<WebGlUniformLocation>,
    to: Option<WebGlUniformLocation>,
}

pub struct GlGeometry(WebGlBuffer);

pub struct GlTexture(WebGlTexture);

/// Graphics backend over `WebGlRenderingContext`.
///
/// Availability is probed once on a scratch canvas; a browser without WebGL
/// reports every capability as missing.
pub struct WebGl {
    available: bool,
}

impl WebGl {
    pub fn probe() -> Self {
        let scratch = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.create_element("canvas").ok())
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .and_then(|canvas| canvas.get_context("webgl").ok().flatten())
            .and_then(|context| context.dyn_into::<GL>().ok());
        if let Some(gl) = &scratch {
            lose_context(gl);
        }
        let available = scratch.is_some();
        debug!(available, "probed WebGL");
        Self { available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

fn compile_shader(gl: &GL, kind: u32, source: &str) -> SlideResult<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| SlideError::Render("could not create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        return Err(SlideError::Render(format!("shader compile failed: {log}")));
    }
    Ok(shader)
}

/// Give the context back to the browser now; pages get only a handful.
fn lose_context(gl: &GL) {
    let extension = gl
        .get_extension("WEBGL_lose_context")
        .ok()
        .flatten()
        .and_then(|ext| ext.dyn_into::<WebglLoseContext>().ok());
    if let Some(ext) = extension {
        ext.lose_context();
    }
}

fn filter(value: Filter) -> i32 {
    match value {
        Filter::Nearest => GL::NEAREST as i32,
        Filter::Linear => GL::LINEAR as i32,
    }
}

#[async_trait(?Send)]
impl Gpu for WebGl {
    type Node = Element;
    type Context = GlContext;
    type Geometry = GlGeometry;
    type Program = GlProgram;
    type Texture = GlTexture;

    fn supports(&self, _capability: Capability) -> bool {
        self.available
    }

    fn create_context(&self, canvas: &Element, width: u32, height: u32) -> SlideResult<GlContext> {
        let canvas = canvas
            .dyn_ref::<HtmlCanvasElement>()
            .ok_or_else(|| SlideError::GpuUnavailable("overlay is not a canvas".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let gl = canvas
            .get_context("webgl")
            .map_err(|e| SlideError::GpuUnavailable(describe(&e)))?
            .ok_or_else(|| SlideError::GpuUnavailable("webgl context refused".into()))?
            .dyn_into::<GL>()
            .map_err(|_| SlideError::GpuUnavailable("unexpected context type".into()))?;
        gl.viewport(0, 0, width as i32, height as i32);
        Ok(GlContext { gl })
    }

    fn create_geometry(&self, context: &GlContext) -> SlideResult<GlGeometry> {
        let gl = &context.gl;
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| SlideError::Render("could not create vertex buffer".into()))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let vertices = Float32Array::from(&QUAD_VERTICES[..]);
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &vertices, GL::STATIC_DRAW);
        Ok(GlGeometry(buffer))
    }

    fn compile_program(&self, context: &GlContext, payload: &EffectPayload) -> SlideResult<GlProgram> {
        let gl = &context.gl;
        let vertex = compile_shader(gl, GL::VERTEX_SHADER, &payload.vertex)?;
        let fragment = match compile_shader(gl, GL::FRAGMENT_SHADER, &payload.fragment) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(Some(&vertex));
                return Err(err);
            }
        };

        let program = gl.create_program().ok_or_else(|| {
            gl.delete_shader(Some(&vertex));
            gl.delete_shader(Some(&fragment));
            SlideError::Render("could not create program".into())
        })?;
        gl.attach_shader(&program, &vertex);
        gl.attach_shader(&program, &fragment);
        gl.link_program(&program);

        let linked = gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        let position = gl.get_attrib_location(&program, uniforms::POSITION);
        if !linked || position < 0 {
            let log = gl.get_program_info_log(&program).unwrap_or_default();
            gl.delete_program(Some(&program));
            gl.delete_shader(Some(&vertex));
            gl.delete_shader(Some(&fragment));
            return Err(SlideError::Render(format!("program link failed: {log}")));
        }

        let location = |name: &str| gl.get_uniform_location(&program, name);
        Ok(GlProgram {
            position: position as u32,
            progress: location(uniforms::PROGRESS),
            time: location(uniforms::TIME),
            resolution: location(uniforms::RESOLUTION),
            from: location(uniforms::FROM_TEXTURE),
            to: location(uniforms::TO_TEXTURE),
            shaders: [vertex, fragment],
            program,
        })
    }

    async fn load_texture(
        &self,
        context: &GlContext,
        image: &Element,
        params: TextureParams,
    ) -> SlideResult<GlTexture> {
        let image = image
            .dyn_ref::<HtmlImageElement>()
            .ok_or_else(|| SlideError::resource_load(image.tag_name(), "not an image element"))?;
        let source = image.current_src();
        JsFuture::from(image.decode())
            .await
            .map_err(|e| SlideError::resource_load(&source, describe(&e)))?;

        let gl = &context.gl;
        let texture = gl
            .create_texture()
            .ok_or_else(|| SlideError::resource_load(&source, "could not create texture"))?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, i32::from(params.flip_y));
        let upload = gl.tex_image_2d_with_u32_and_u32_and_image(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            image,
        );
        if let Err(err) = upload {
            gl.delete_texture(Some(&texture));
            return Err(SlideError::resource_load(&source, describe(&err)));
        }

        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, filter(params.min_filter));
        gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, filter(params.mag_filter));
        if params.clamp_to_edge {
            gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
            gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
        }
        debug!(source = %source, "texture uploaded");
        Ok(GlTexture(texture))
    }

    fn draw(&self, frame: &slidefx_render::gpu::Frame<'_, Self>) -> SlideResult<()> {
        let gl = &frame.context.gl;
        if gl.is_context_lost() {
            return Err(SlideError::Render("webgl context lost".into()));
        }
        let program = frame.program;
        gl.use_program(Some(&program.program));

        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&frame.geometry.0));
        gl.enable_vertex_attrib_array(program.position);
        gl.vertex_attrib_pointer_with_i32(program.position, 2, GL::FLOAT, false, 0, 0);

        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&frame.from.0));
        gl.uniform1i(program.from.as_ref(), 0);
        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&frame.to.0));
        gl.uniform1i(program.to.as_ref(), 1);

        let u = frame.uniforms;
        gl.uniform1f(program.progress.as_ref(), u.progress);
        gl.uniform1f(program.time.as_ref(), u.time);
        gl.uniform2f(program.resolution.as_ref(), u.resolution[0], u.resolution[1]);

        gl.draw_arrays(GL::TRIANGLE_STRIP, 0, 4);
        Ok(())
    }

    fn release_texture(&self, context: &GlContext, texture: GlTexture) {
        context.gl.delete_texture(Some(&texture.0));
    }

    fn release_program(&self, context: &GlContext, program: GlProgram) {
        let gl = &context.gl;
        gl.delete_program(Some(&program.program));
        for shader in &program.shaders {
            gl.delete_shader(Some(shader));
        }
    }

    fn release_geometry(&self, context: &GlContext, geometry: GlGeometry) {
        context.gl.delete_buffer(Some(&geometry.0));
    }

    fn release_context(&self, context: GlContext) {
        lose_context(&context.gl);
    }
}
