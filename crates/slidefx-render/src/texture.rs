//! Texture loading for a transition's image pair.

use slidefx_core::{SlideError, SlideResult};
use tracing::debug;

use crate::gpu::{Gpu, TextureParams};

/// Decode `image` and upload it with linear filtering.
pub async fn load_texture<G: Gpu>(
    gpu: &G,
    context: &G::Context,
    image: &G::Node,
) -> SlideResult<G::Texture> {
    match gpu.load_texture(context, image, TextureParams::LINEAR).await {
        Ok(texture) => {
            debug!(?image, "texture loaded");
            Ok(texture)
        }
        Err(err @ SlideError::ResourceLoad(_)) => Err(err),
        Err(other) => Err(SlideError::resource_load(format!("{image:?}"), other)),
    }
}

/// Load both sides concurrently and wait for both to settle.
///
/// Each side's result is returned as-is: when one side fails, the other
/// side's texture is still handed back so the caller can release it.
pub async fn load_pair<G: Gpu>(
    gpu: &G,
    context: &G::Context,
    from: &G::Node,
    to: &G::Node,
) -> (SlideResult<G::Texture>, SlideResult<G::Texture>) {
    futures::join!(
        load_texture(gpu, context, from),
        load_texture(gpu, context, to)
    )
}
