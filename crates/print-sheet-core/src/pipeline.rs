use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, info, instrument, warn};

use crate::caption::CaptionFont;
use crate::compositing::{Compositor, Tile, blit_tiles, draw_border};
use crate::config::{FitMode, LayoutConfig};
use crate::density::{DensityOutcome, stamp_density_in_place};
use crate::error::{PrintSheetError, Result};
use crate::model::{LayoutRequest, PlacedItem, PlacementRequest, Rect, SheetLayout, UnfitItem};
use crate::packer::{GuillotinePacker, Placement};
use crate::sizes::PhysicalSize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A finished sheet: layout record, page raster and print-ready JPEG bytes.
pub struct SheetOutput {
    pub layout: SheetLayout,
    pub raster: RgbImage,
    /// JPEG stream with the configured DPI in its JFIF header.
    pub jpeg: Vec<u8>,
}

impl SheetOutput {
    /// Instances that did not fit. Callers should surface this to the user.
    pub fn unfit_count(&self) -> usize {
        self.layout.unfit_count()
    }

    /// Computes sheet statistics.
    /// This is a convenience method that delegates to `layout.stats()`.
    pub fn stats(&self) -> crate::model::SheetStats {
        self.layout.stats()
    }
}

/// One expanded copy of a request.
#[derive(Debug, Clone, Copy)]
struct Instance {
    request: usize,
    copy: u32,
    w: u32,
    h: u32,
}

fn validate_requests(requests: &[LayoutRequest], cfg: &LayoutConfig) -> Result<()> {
    cfg.validate()?;
    if requests.is_empty() {
        return Err(PrintSheetError::Empty);
    }
    let (usable_w, usable_h) = cfg.usable_size();
    for (i, r) in requests.iter().enumerate() {
        if r.width == 0 || r.height == 0 {
            return Err(PrintSheetError::InvalidDimensions {
                width: r.width,
                height: r.height,
            });
        }
        if r.copies == 0 {
            return Err(PrintSheetError::InvalidInput(format!(
                "request {i} asks for zero copies"
            )));
        }
        if r.width > usable_w || r.height > usable_h {
            return Err(PrintSheetError::ItemTooLarge {
                request: i,
                width: r.width,
                height: r.height,
                usable_width: usable_w,
                usable_height: usable_h,
            });
        }
    }
    Ok(())
}

/// Expands requests into copies, largest area first. The sort is stable, so
/// equal areas keep request order.
fn expand(requests: &[LayoutRequest]) -> Vec<Instance> {
    let mut instances: Vec<Instance> = requests
        .iter()
        .enumerate()
        .flat_map(|(request, r)| {
            (0..r.copies).map(move |copy| Instance {
                request,
                copy,
                w: r.width,
                h: r.height,
            })
        })
        .collect();
    instances.sort_by(|a, b| (b.w as u64 * b.h as u64).cmp(&(a.w as u64 * a.h as u64)));
    instances
}

/// Horizontal offset that centers the bounding box of the placed frames.
fn centering_offset(page_width: u32, frames: &[Rect]) -> u32 {
    let Some(min_x) = frames.iter().map(|r| r.x).min() else {
        return 0;
    };
    let max_x = frames.iter().map(|r| r.x + r.w).max().unwrap_or(min_x);
    let span = max_x - min_x;
    (page_width.saturating_sub(span) / 2).saturating_sub(min_x)
}

fn layout_unchecked(requests: &[LayoutRequest], cfg: &LayoutConfig) -> SheetLayout {
    let instances = expand(requests);
    let (usable_w, usable_h) = cfg.usable_size();
    let mut packer = GuillotinePacker::new(usable_w, usable_h);
    let sizes: Vec<(u32, u32)> = instances.iter().map(|i| (i.w, i.h)).collect();
    let placements = packer.pack(&sizes);
    debug!(
        instances = instances.len(),
        nodes = packer.node_count(),
        "packing finished"
    );

    let mut packed: Vec<(Instance, Rect)> = Vec::with_capacity(instances.len());
    let mut unfit: Vec<UnfitItem> = Vec::new();
    for (inst, placement) in instances.iter().zip(placements) {
        match placement {
            Placement::Placed { x, y } => packed.push((*inst, Rect::new(x, y, inst.w, inst.h))),
            Placement::Unfit => unfit.push(UnfitItem {
                request: inst.request,
                copy: inst.copy,
                width: inst.w,
                height: inst.h,
            }),
        }
    }

    let frames: Vec<Rect> = packed.iter().map(|(_, r)| *r).collect();
    let offset_x = centering_offset(cfg.page_width, &frames);
    let placements = packed
        .into_iter()
        .map(|(inst, r)| PlacedItem {
            request: inst.request,
            copy: inst.copy,
            frame: Rect::new(r.x + offset_x, r.y + cfg.margin, r.w, r.h),
        })
        .collect();

    SheetLayout {
        page_width: cfg.page_width,
        page_height: cfg.page_height,
        margin: cfg.margin,
        dpi: cfg.dpi,
        offset_x,
        placements,
        unfit,
    }
}

#[instrument(skip_all)]
/// Computes placements for `requests` without rendering any pixels.
///
/// Notes:
/// - Requests are expanded into one rectangle per copy and sorted by
///   descending area before packing; no rotation is attempted.
/// - Instances that do not fit are listed in `SheetLayout::unfit`; this is not an error.
/// - Zero sizes, zero copies or items larger than the usable area fail fast.
pub fn plan_layout(requests: &[LayoutRequest], cfg: &LayoutConfig) -> Result<SheetLayout> {
    validate_requests(requests, cfg)?;
    let layout = layout_unchecked(requests, cfg);
    if !layout.unfit.is_empty() {
        warn!(
            unfit = layout.unfit.len(),
            placed = layout.placements.len(),
            "not all requested prints fit on the page"
        );
    }
    Ok(layout)
}

/// Encodes an RGB raster as baseline JPEG.
pub fn encode_jpeg(raster: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(raster)?;
    Ok(bytes)
}

fn encode_with_density(raster: &RgbImage, cfg: &LayoutConfig) -> Result<Vec<u8>> {
    let mut jpeg = encode_jpeg(raster, cfg.jpeg_quality)?;
    if stamp_density_in_place(&mut jpeg, cfg.dpi) != DensityOutcome::Stamped {
        warn!(dpi = cfg.dpi, "encoded page has no JFIF segment; density not stamped");
    }
    Ok(jpeg)
}

/// Lays out, renders and encodes photo sheets.
pub struct SheetBuilder {
    cfg: LayoutConfig,
    compositor: Compositor,
    cancel: Option<Arc<AtomicBool>>,
}

impl SheetBuilder {
    pub fn new(cfg: LayoutConfig) -> Self {
        let compositor = Compositor::new(&cfg);
        Self {
            cfg,
            compositor,
            cancel: None,
        }
    }

    /// Font for caption text. Without one, caption bands are drawn empty.
    pub fn with_font(mut self, font: impl Into<Arc<CaptionFont>>) -> Self {
        self.compositor = self.compositor.with_font(font);
        self
    }

    /// Flag polled between stages; once set, `build_page` returns `Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    fn check_cancel(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(PrintSheetError::Cancelled),
            _ => Ok(()),
        }
    }

    fn render_tile(&self, requests: &[PlacementRequest], p: &PlacedItem) -> Result<Tile> {
        self.check_cancel()?;
        let item = &requests[p.request].item;
        let mut image =
            self.compositor
                .composite(&item.image, p.frame.w, p.frame.h, item.caption_text())?;
        draw_border(&mut image, self.cfg.border_width, self.cfg.border_color);
        Ok(Tile {
            x: p.frame.x,
            y: p.frame.y,
            image,
        })
    }

    #[instrument(skip_all, fields(requests = requests.len()))]
    /// Builds one page from `requests`.
    ///
    /// Returns the page even when some copies did not fit; check
    /// [`SheetOutput::unfit_count`]. Invalid geometry fails before any packing.
    pub fn build_page(&self, requests: &[PlacementRequest]) -> Result<SheetOutput> {
        let geometry: Vec<LayoutRequest> = requests.iter().map(LayoutRequest::from).collect();
        validate_requests(&geometry, &self.cfg)?;
        for (i, r) in requests.iter().enumerate() {
            if r.item.image.width() == 0 || r.item.image.height() == 0 {
                return Err(PrintSheetError::InvalidInput(format!(
                    "request {i} has an empty source image"
                )));
            }
        }
        self.check_cancel()?;

        let layout = layout_unchecked(&geometry, &self.cfg);
        if !layout.unfit.is_empty() {
            warn!(
                unfit = layout.unfit.len(),
                placed = layout.placements.len(),
                "not all requested prints fit on the page"
            );
        }

        #[cfg(feature = "parallel")]
        let tiles: Vec<Tile> = if self.cfg.parallel {
            layout
                .placements
                .par_iter()
                .map(|p| self.render_tile(requests, p))
                .collect::<Result<_>>()?
        } else {
            layout
                .placements
                .iter()
                .map(|p| self.render_tile(requests, p))
                .collect::<Result<_>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let tiles: Vec<Tile> = layout
            .placements
            .iter()
            .map(|p| self.render_tile(requests, p))
            .collect::<Result<_>>()?;

        let mut raster = RgbImage::from_pixel(
            self.cfg.page_width,
            self.cfg.page_height,
            Rgb(self.cfg.background),
        );
        blit_tiles(&mut raster, &tiles);
        self.check_cancel()?;

        let jpeg = encode_with_density(&raster, &self.cfg)?;
        info!(
            placed = layout.placements.len(),
            unfit = layout.unfit.len(),
            bytes = jpeg.len(),
            dpi = self.cfg.dpi,
            "sheet rendered"
        );
        Ok(SheetOutput {
            layout,
            raster,
            jpeg,
        })
    }
}

/// Builds one page with default compositor settings and no caption font.
pub fn build_page(requests: &[PlacementRequest], cfg: LayoutConfig) -> Result<SheetOutput> {
    SheetBuilder::new(cfg).build_page(requests)
}

/// A single photo resized to a physical print size.
pub struct ResizeOutput {
    pub raster: RgbImage,
    pub jpeg: Vec<u8>,
}

impl ResizeOutput {
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }
}

#[instrument(skip_all, fields(size = size.code))]
/// Resizes one photo to `size` at `cfg.dpi`, oriented like the source, and
/// returns a print-ready JPEG.
pub fn resize_photo(
    source: &DynamicImage,
    size: &PhysicalSize,
    mode: FitMode,
    cfg: &LayoutConfig,
) -> Result<ResizeOutput> {
    cfg.validate()?;
    if size.width_in <= 0.0 || size.height_in <= 0.0 {
        return Err(PrintSheetError::InvalidInput(format!(
            "print size {}x{} in is not positive",
            size.width_in, size.height_in
        )));
    }
    let (w, h) = size.oriented_pixel_size(cfg.dpi, source.width(), source.height());
    debug!(w, h, ?mode, "resizing photo");
    let raster = Compositor::new(cfg).render(source, w, h, mode)?;
    let jpeg = encode_with_density(&raster, cfg)?;
    Ok(ResizeOutput { raster, jpeg })
}
