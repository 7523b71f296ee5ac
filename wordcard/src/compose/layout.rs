//! Caption geometry.
//!
//! Pure layout math for the caption band: where the band sits, how large
//! the text is, and how the sentence wraps into lines. Keeping this free of
//! any pixel work makes the numbers easy to test exactly.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use crate::config::ComposeConfig;

/// Average glyph advance as a fraction of the font size. Used to estimate
/// how many characters fit on one line before wrapping.
const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Styling knobs for the caption band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionStyle {
    /// Fraction of the image height reserved for the caption band.
    pub band_ratio: f32,
    /// Opacity of the darkening scrim behind the text, 0 to 255.
    pub scrim_alpha: u8,
    /// Font size as a fraction of the band height.
    pub font_scale: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
}

impl From<&ComposeConfig> for CaptionStyle {
    fn from(config: &ComposeConfig) -> Self {
        Self {
            band_ratio: config.band_ratio,
            scrim_alpha: config.scrim_alpha,
            font_scale: config.font_scale,
            line_spacing: config.line_spacing,
        }
    }
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::from(&ComposeConfig::default())
    }
}

/// Resolved geometry for one caption over one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    /// First row of the caption band.
    pub band_top: u32,
    /// Height of the caption band in pixels.
    pub band_height: u32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Vertical advance between line tops.
    pub line_height: f32,
    /// Top of the first text line, centered within the band.
    pub text_top: f32,
    /// Wrapped caption lines, in reading order.
    pub lines: Vec<String>,
}

/// Compute the caption geometry for an image of `width` by `height`.
///
/// The band occupies the bottom `band_ratio` of the image. Text is sized
/// relative to the band, wrapped to an estimated character budget, and
/// centered vertically. When the wrapped block is taller than the band the
/// text starts at the band top and overflows downward.
pub fn layout_caption(
    width: u32,
    height: u32,
    caption: &str,
    style: &CaptionStyle,
) -> CaptionLayout {
    let band_height = ((height as f32 * style.band_ratio) as u32).min(height);
    let band_top = height - band_height;
    let font_size = band_height as f32 * style.font_scale;
    let line_height = font_size * style.line_spacing;

    let max_chars = if font_size > 0.0 {
        ((width as f32 / (font_size * CHAR_WIDTH_FACTOR)) as usize).max(1)
    } else {
        1
    };
    let lines = wrap_words(caption, max_chars);

    let band_top_f = band_top as f32;
    let total_height = lines.len() as f32 * line_height;
    let text_top = if total_height < band_height as f32 {
        band_top_f + (band_height as f32 - total_height) / 2.0
    } else {
        band_top_f
    };

    CaptionLayout {
        band_top,
        band_height,
        font_size,
        line_height,
        text_top,
        lines,
    }
}

/// Greedy word wrap. Words are never split: one that exceeds `max_chars`
/// on its own gets its own overflowing line. Whitespace runs collapse to
/// single spaces and an all-whitespace input yields no lines.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
