//! Flashcard composition.
//!
//! Takes a stored raw illustration, darkens the bottom band, draws the
//! caption sentence in white over it and stores the result as the final
//! card image. Decoding, blending and glyph rasterization run on a
//! blocking thread so the async pipeline is never stalled by pixel work.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

mod layout;

pub use layout::{CaptionLayout, CaptionStyle, layout_caption, wrap_words};

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontArc, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, instrument};

use crate::blob::{BlobStore, IMAGE_PNG};
use crate::config::ComposeConfig;
use crate::error::{CompositionError, Error, Result};
use crate::generation::GenerationId;
use crate::location::{AssetLocation, composed_image_path};

/// Well-known font locations tried when no caption font is configured.
const SYSTEM_FONT_PATHS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// Find the first available system caption font.
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load the caption font named in `config`, falling back to well-known
/// system locations. A configured path is authoritative: when it cannot be
/// read the error surfaces instead of silently picking another font.
pub fn load_caption_font(config: &ComposeConfig) -> Result<FontArc> {
    let path = config
        .font_path
        .clone()
        .or_else(find_system_font)
        .ok_or_else(|| {
            Error::config("no caption font found; set compose.font_path or WORDCARD_FONT_PATH")
        })?;
    load_font_file(&path)
}

fn load_font_file(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)
        .map_err(|err| Error::config(format!("reading font {}: {err}", path.display())))?;
    FontArc::try_from_vec(bytes)
        .map_err(|err| Error::config(format!("parsing font {}: {err}", path.display())))
}

/// Renders caption cards from stored raw illustrations.
#[derive(Clone)]
pub struct CardCompositor {
    store: Arc<dyn BlobStore>,
    font: FontArc,
    style: CaptionStyle,
}

impl fmt::Debug for CardCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardCompositor")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl CardCompositor {
    /// Create a compositor over `store`, loading the caption font from
    /// `config`.
    pub fn new(store: Arc<dyn BlobStore>, config: &ComposeConfig) -> Result<Self> {
        let font = load_caption_font(config)?;
        Ok(Self::with_font(store, font, CaptionStyle::from(config)))
    }

    /// Create a compositor with an already loaded font.
    pub fn with_font(store: Arc<dyn BlobStore>, font: FontArc, style: CaptionStyle) -> Self {
        Self { store, font, style }
    }

    /// Compose the final card for `id`: fetch the raw image at `raw`,
    /// draw `caption` over the darkened bottom band and store the result
    /// under the composed path.
    #[instrument(skip(self, caption), fields(id = %id))]
    pub async fn compose(
        &self,
        id: &GenerationId,
        raw: &AssetLocation,
        caption: &str,
    ) -> Result<AssetLocation> {
        if raw.scheme() != self.store.scheme() {
            return Err(CompositionError::invalid_location(format!(
                "cannot fetch `{raw}`: this run stores media under scheme `{}`",
                self.store.scheme()
            ))
            .into());
        }

        let raw_bytes = self
            .store
            .get(raw)
            .await
            .map_err(|err| CompositionError::fetch(format!("fetching `{raw}`: {err}")))?;
        debug!(bytes = raw_bytes.len(), "fetched raw image");

        let font = self.font.clone();
        let style = self.style;
        let caption = caption.to_owned();
        let composed =
            tokio::task::spawn_blocking(move || render_card(&raw_bytes, &caption, &font, &style))
                .await
                .map_err(|err| CompositionError::render(format!("render task failed: {err}")))??;

        let location = self
            .store
            .put(&composed_image_path(id), composed, IMAGE_PNG)
            .await?;
        debug!(location = %location, "stored composed card");
        Ok(location)
    }
}

fn render_card(
    bytes: &[u8],
    caption: &str,
    font: &FontArc,
    style: &CaptionStyle,
) -> std::result::Result<Vec<u8>, CompositionError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| CompositionError::decode(err.to_string()))?;
    let mut canvas = decoded.to_rgb8();
    let (width, height) = canvas.dimensions();

    let layout = layout_caption(width, height, caption, style);
    apply_scrim(&mut canvas, layout.band_top, style.scrim_alpha);
    draw_caption(&mut canvas, &layout, font);

    let mut cursor = Cursor::new(Vec::new());
    canvas
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| CompositionError::encode(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Darken every row from `band_top` down by blending toward black with
/// `alpha` opacity.
fn apply_scrim(canvas: &mut RgbImage, band_top: u32, alpha: u8) {
    let keep = 255 - alpha;
    let (width, height) = canvas.dimensions();
    for y in band_top..height {
        for x in 0..width {
            let pixel = canvas.get_pixel_mut(x, y);
            for channel in &mut pixel.0 {
                *channel = mul_div255(*channel, keep);
            }
        }
    }
}

/// Integer scale of a channel by `factor / 255`, rounding to nearest.
fn mul_div255(value: u8, factor: u8) -> u8 {
    ((u32::from(value) * u32::from(factor) + 127) / 255) as u8
}

fn draw_caption(canvas: &mut RgbImage, layout: &CaptionLayout, font: &FontArc) {
    let scale = PxScale::from(layout.font_size);
    let width = canvas.width();
    for (index, line) in layout.lines.iter().enumerate() {
        let (line_width, _) = text_size(scale, font, line);
        let x = ((i64::from(width) - i64::from(line_width)) / 2).max(0) as i32;
        let y = (layout.text_top + index as f32 * layout.line_height) as i32;
        draw_text_mut(canvas, Rgb([255, 255, 255]), x, y, scale, font, line);
    }
}

/// Best-effort font lookup for raster tests. Tests that need glyphs skip
/// when the host has no usable font.
#[cfg(test)]
pub(crate) fn system_caption_font() -> Option<FontArc> {
    let path = std::env::var_os("WORDCARD_FONT_PATH")
        .map(PathBuf::from)
        .filter(|path| path.exists())
        .or_else(find_system_font)?;
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}
