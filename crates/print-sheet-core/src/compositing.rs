use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

use crate::caption::{self, CaptionFont};
use crate::config::{CaptionStyle, FitMode, LayoutConfig};
use crate::error::{PrintSheetError, Result};
use crate::model::Rect;

/// Source region kept by a "cover" fit: the largest centered slice of the
/// source with the target's aspect ratio.
pub fn cover_crop(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> Rect {
    let image_aspect = src_w as f64 / src_h as f64;
    let target_aspect = target_w as f64 / target_h as f64;
    if image_aspect > target_aspect {
        let w = ((src_h as f64 * target_aspect).round() as u32).clamp(1, src_w);
        Rect::new((src_w - w) / 2, 0, w, src_h)
    } else {
        let h = ((src_w as f64 / target_aspect).round() as u32).clamp(1, src_h);
        Rect::new(0, (src_h - h) / 2, src_w, h)
    }
}

/// Destination region for a "contain" fit: the source scaled uniformly to fit
/// inside the target and centered.
pub fn contain_rect(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> Rect {
    let scale = (target_w as f64 / src_w as f64).min(target_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, target_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, target_h);
    Rect::new((target_w - w) / 2, (target_h - h) / 2, w, h)
}

/// Blends RGBA onto an opaque background.
fn flatten(src: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let (w, h) = src.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let p = src.get_pixel(x, y).0;
        if p[3] == 255 {
            return Rgb([p[0], p[1], p[2]]);
        }
        let a = p[3] as f32 / 255.0;
        let inv = 1.0 - a;
        Rgb([
            (p[0] as f32 * a + background[0] as f32 * inv).round() as u8,
            (p[1] as f32 * a + background[1] as f32 * inv).round() as u8,
            (p[2] as f32 * a + background[2] as f32 * inv).round() as u8,
        ])
    })
}

fn scale_exact(src: &RgbaImage, w: u32, h: u32, filter: FilterType) -> RgbaImage {
    if src.dimensions() == (w, h) {
        src.clone()
    } else {
        imageops::resize(src, w, h, filter)
    }
}

/// Strokes a cut guide of `width` pixels just inside the edges of `tile`.
pub fn draw_border(tile: &mut RgbImage, width: u32, color: [u8; 3]) {
    let (w, h) = tile.dimensions();
    if width == 0 || w == 0 || h == 0 {
        return;
    }
    let bw = width.min(w);
    let bh = width.min(h);
    let c = Rgb(color);
    for y in 0..h {
        for x in 0..w {
            if x < bw || x >= w - bw || y < bh || y >= h - bh {
                tile.put_pixel(x, y, c);
            }
        }
    }
}

/// Renders source images into exact target boxes.
#[derive(Debug, Clone)]
pub struct Compositor {
    filter: FilterType,
    background: [u8; 3],
    caption: CaptionStyle,
    font: Option<Arc<CaptionFont>>,
}

impl Compositor {
    pub fn new(cfg: &LayoutConfig) -> Self {
        Self {
            filter: cfg.filter.filter_type(),
            background: cfg.background,
            caption: cfg.caption,
            font: None,
        }
    }

    pub fn with_font(mut self, font: impl Into<Arc<CaptionFont>>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn font(&self) -> Option<&CaptionFont> {
        self.font.as_deref()
    }

    fn check(source: &DynamicImage, w: u32, h: u32) -> Result<()> {
        if w == 0 || h == 0 {
            return Err(PrintSheetError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(PrintSheetError::InvalidInput(
                "source image has no pixels".into(),
            ));
        }
        Ok(())
    }

    /// "Cover" render of `source` into exactly `width x height`, with the
    /// caption band when `caption` is `Some` (text may be empty).
    pub fn composite(
        &self,
        source: &DynamicImage,
        width: u32,
        height: u32,
        caption: Option<&str>,
    ) -> Result<RgbImage> {
        Self::check(source, width, height)?;
        let crop = cover_crop(source.width(), source.height(), width, height);
        let rgba = source.crop_imm(crop.x, crop.y, crop.w, crop.h).to_rgba8();
        let scaled = scale_exact(&rgba, width, height, self.filter);
        let mut out = flatten(&scaled, self.background);
        if let Some(text) = caption {
            caption::draw_caption(&mut out, text, self.font.as_deref(), &self.caption);
        }
        Ok(out)
    }

    /// "Contain" render: the whole source, centered, on a background-filled box.
    pub fn contain(&self, source: &DynamicImage, width: u32, height: u32) -> Result<RgbImage> {
        Self::check(source, width, height)?;
        let dst = contain_rect(source.width(), source.height(), width, height);
        let scaled = scale_exact(&source.to_rgba8(), dst.w, dst.h, self.filter);
        let mut out = RgbImage::from_pixel(width, height, Rgb(self.background));
        imageops::replace(&mut out, &flatten(&scaled, self.background), dst.x as i64, dst.y as i64);
        Ok(out)
    }

    pub fn render(
        &self,
        source: &DynamicImage,
        width: u32,
        height: u32,
        mode: FitMode,
    ) -> Result<RgbImage> {
        match mode {
            FitMode::Cover => self.composite(source, width, height, None),
            FitMode::Contain => self.contain(source, width, height),
        }
    }
}

/// A rendered photo and its top-left position on the page.
#[derive(Debug, Clone)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub image: RgbImage,
}

impl Tile {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.image.width(), self.image.height())
    }
}

fn blit_row(y: u32, row: &mut [u8], page_w: u32, tiles: &[Tile]) {
    for t in tiles {
        let (tw, th) = t.image.dimensions();
        if y < t.y || y >= t.y + th || t.x >= page_w {
            continue;
        }
        let w = tw.min(page_w - t.x) as usize;
        let src_start = ((y - t.y) * tw) as usize * 3;
        let dst_start = t.x as usize * 3;
        row[dst_start..dst_start + w * 3]
            .copy_from_slice(&t.image.as_raw()[src_start..src_start + w * 3]);
    }
}

/// Copies `tiles` into `page`.
///
/// The page buffer is split into one mutable slice per row before any write, so
/// writers never alias. Tiles must not overlap, otherwise the later tile wins.
pub fn blit_tiles(page: &mut RgbImage, tiles: &[Tile]) {
    let (page_w, page_h) = page.dimensions();
    if page_w == 0 || page_h == 0 || tiles.is_empty() {
        return;
    }
    let stride = page_w as usize * 3;
    let buf: &mut [u8] = page;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        buf.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| blit_row(y as u32, row, page_w, tiles));
    }
    #[cfg(not(feature = "parallel"))]
    {
        buf.chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| blit_row(y as u32, row, page_w, tiles));
    }
}
