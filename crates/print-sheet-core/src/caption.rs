//! Caption band rendering.
//!
//! A caption is a solid band across the bottom of a photo with one line of
//! upper-cased text centered inside it. Short captions are stretched
//! horizontally (never vertically) to fill the band; the stretch is capped.

use std::path::Path;

use fontdue::{Font, FontSettings};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use tracing::{debug, warn};

use crate::config::CaptionStyle;
use crate::error::{PrintSheetError, Result};

/// Bold sans-serif fonts probed by [`CaptionFont::discover`], in order.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Parsed font used for caption text.
pub struct CaptionFont {
    font: Font,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("name", &self.font.name())
            .finish()
    }
}

impl CaptionFont {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| PrintSheetError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Loads the first well-known bold sans-serif system font that parses.
    pub fn discover() -> Option<Self> {
        SYSTEM_FONT_CANDIDATES.iter().find_map(|p| {
            let path = Path::new(p);
            if !path.is_file() {
                return None;
            }
            match Self::from_path(path) {
                Ok(f) => {
                    debug!(path = %path.display(), "caption font loaded");
                    Some(f)
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "caption font rejected");
                    None
                }
            }
        })
    }

    /// Advance width of `text` at `px`, kerning included.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, ch, px).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, px).advance_width;
            prev = Some(ch);
        }
        width
    }

    /// Renders one line of text into a coverage mask.
    ///
    /// Returns the mask and the x position of the pen origin inside it (glyphs
    /// may overhang to the left of the origin).
    fn rasterize_line(&self, text: &str, px: f32) -> (GrayImage, f32) {
        let (ascent, descent) = match self.font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent, lm.descent),
            None => (px * 0.8, -px * 0.2),
        };
        let height = (ascent - descent).ceil().max(1.0) as u32;

        // pen positions first, to size the mask
        let mut glyphs = Vec::new();
        let mut caret = 0.0f32;
        let mut prev: Option<char> = None;
        let mut min_x = 0.0f32;
        let mut max_x = 0.0f32;
        for ch in text.chars() {
            if let Some(p) = prev {
                caret += self.font.horizontal_kern(p, ch, px).unwrap_or(0.0);
            }
            let (m, bitmap) = self.font.rasterize(ch, px);
            let gx = caret + m.xmin as f32;
            min_x = min_x.min(gx);
            max_x = max_x.max(gx + m.width as f32).max(caret + m.advance_width);
            glyphs.push((gx, m, bitmap));
            caret += m.advance_width;
            prev = Some(ch);
        }

        let origin = -min_x.floor();
        let width = (max_x + origin).ceil().max(1.0) as u32;
        let mut mask = GrayImage::new(width, height);
        let baseline = ascent.round() as i32;
        for (gx, m, bitmap) in glyphs {
            let left = (gx + origin).round() as i32;
            let top = baseline - (m.ymin + m.height as i32);
            for row in 0..m.height {
                let y = top + row as i32;
                if y < 0 || y >= height as i32 {
                    continue;
                }
                for col in 0..m.width {
                    let x = left + col as i32;
                    if x < 0 || x >= width as i32 {
                        continue;
                    }
                    let v = bitmap[row * m.width + col];
                    let dst = mask.get_pixel_mut(x as u32, y as u32);
                    dst.0[0] = dst.0[0].max(v);
                }
            }
        }
        (mask, origin)
    }
}

/// Horizontal glyph scale for text of `measured` width in a band with
/// `available` width.
///
/// Narrow text (below `stretch_threshold` of the available width) is stretched
/// to fill it, overlong text is squeezed to fit, and the factor never exceeds
/// `max_stretch`.
pub fn horizontal_scale(measured: f32, available: f32, style: &CaptionStyle) -> f32 {
    if !(measured > 0.0) || !(available > 0.0) {
        return 1.0;
    }
    let scale = if measured < available * style.stretch_threshold || measured > available {
        available / measured
    } else {
        1.0
    };
    scale.min(style.max_stretch)
}

/// Band height in pixels for a photo of height `h`.
pub fn band_height(h: u32, style: &CaptionStyle) -> u32 {
    // small epsilon so 200 * 0.12 floors to 24, not 23
    (h as f32 * style.band_ratio + 1e-3).floor() as u32
}

/// Draws the caption band and, when a font is available, its text.
pub fn draw_caption(
    canvas: &mut RgbImage,
    text: &str,
    font: Option<&CaptionFont>,
    style: &CaptionStyle,
) {
    let (w, h) = canvas.dimensions();
    let band_h = band_height(h, style);
    if band_h == 0 || w == 0 {
        return;
    }
    let band_y = h - band_h;
    let band = image::Rgb(style.band_color);
    for y in band_y..h {
        for x in 0..w {
            canvas.put_pixel(x, y, band);
        }
    }

    let text = text.trim().to_uppercase();
    if text.is_empty() {
        return;
    }
    let Some(font) = font else {
        warn!(caption = %text, "no caption font available; drawing band only");
        return;
    };
    let px = (band_h as f32 * style.font_ratio + 1e-3).floor();
    if px < 1.0 {
        return;
    }

    let measured = font.measure(&text, px);
    let available = w as f32 * (1.0 - 2.0 * style.side_margin_ratio);
    let scale_x = horizontal_scale(measured, available, style);

    let (mask, origin) = font.rasterize_line(&text, px);
    let scaled_w = ((mask.width() as f32 * scale_x).round() as u32).max(1);
    let mask = if scaled_w == mask.width() {
        mask
    } else {
        imageops::resize(&mask, scaled_w, mask.height(), FilterType::Triangle)
    };

    // center the advance box, not the ink box
    let pen_x = w as f32 / 2.0 - measured * scale_x / 2.0;
    let left = (pen_x - origin * scale_x).round() as i64;
    let top = band_y as i64 + (band_h as i64 - mask.height() as i64) / 2;
    let color = style.text_color;
    for (mx, my, Luma([a])) in mask.enumerate_pixels() {
        if *a == 0 {
            continue;
        }
        let x = left + mx as i64;
        let y = top + my as i64;
        if x < 0 || x >= w as i64 || y < band_y as i64 || y >= h as i64 {
            continue;
        }
        let dst = canvas.get_pixel_mut(x as u32, y as u32);
        let sa = *a as f32 / 255.0;
        let inv = 1.0 - sa;
        for c in 0..3 {
            dst.0[c] = (color[c] as f32 * sa + dst.0[c] as f32 * inv).round() as u8;
        }
    }
}
