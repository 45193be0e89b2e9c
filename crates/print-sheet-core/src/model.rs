use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        if self.w == 0 || self.h == 0 || r.w == 0 || r.h == 0 {
            return false;
        }
        !(self.x >= r.x + r.w || r.x >= self.x + self.w || self.y >= r.y + r.h || r.y >= self.y + self.h)
    }
}

/// One photo to print: target pixel size, decoded source, optional caption.
///
/// Many sheet instances may share the same item (one per requested copy), so
/// the source image sits behind an `Arc` and is never mutated.
#[derive(Debug, Clone)]
pub struct PrintItem {
    pub width: u32,
    pub height: u32,
    pub image: Arc<DynamicImage>,
    pub caption: Option<String>,
    pub caption_enabled: bool,
}

impl PrintItem {
    pub fn new(image: impl Into<Arc<DynamicImage>>, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            image: image.into(),
            caption: None,
            caption_enabled: false,
        }
    }

    /// Enables the caption band and sets its text.
    pub fn with_caption(mut self, text: impl Into<String>) -> Self {
        self.caption = Some(text.into());
        self.caption_enabled = true;
        self
    }

    /// Caption text handed to the compositor: `Some` when the band is enabled
    /// (possibly with empty text), `None` otherwise.
    pub fn caption_text(&self) -> Option<&str> {
        if self.caption_enabled {
            Some(self.caption.as_deref().unwrap_or(""))
        } else {
            None
        }
    }
}

/// `copies` instances of the same item.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub item: Arc<PrintItem>,
    pub copies: u32,
}

impl PlacementRequest {
    pub fn new(item: impl Into<Arc<PrintItem>>, copies: u32) -> Self {
        Self {
            item: item.into(),
            copies,
        }
    }
}

/// Geometry-only request used by [`crate::plan_layout`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutRequest {
    pub width: u32,
    pub height: u32,
    pub copies: u32,
}

impl LayoutRequest {
    pub fn new(width: u32, height: u32, copies: u32) -> Self {
        Self {
            width,
            height,
            copies,
        }
    }
}

impl From<&PlacementRequest> for LayoutRequest {
    fn from(r: &PlacementRequest) -> Self {
        Self::new(r.item.width, r.item.height, r.copies)
    }
}

/// A placed instance in page coordinates (centering offset and top margin applied).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedItem {
    /// Index of the originating request.
    pub request: usize,
    /// Copy number within the request (0-based).
    pub copy: u32,
    pub frame: Rect,
}

/// An instance that did not fit on the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnfitItem {
    pub request: usize,
    pub copy: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of laying out one sheet, without pixel data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetLayout {
    pub page_width: u32,
    pub page_height: u32,
    pub margin: u32,
    pub dpi: u16,
    /// Horizontal offset applied to packer coordinates to center the placed block.
    pub offset_x: u32,
    pub placements: Vec<PlacedItem>,
    pub unfit: Vec<UnfitItem>,
}

/// Statistics about sheet usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SheetStats {
    /// Number of instances placed on the page.
    pub placed: usize,
    /// Number of instances that did not fit.
    pub unfit: usize,
    /// Sum of placed frame areas.
    pub used_area: u64,
    /// Packable area: page width * (page height - margin).
    pub usable_area: u64,
    /// used_area / usable_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl SheetLayout {
    pub fn unfit_count(&self) -> usize {
        self.unfit.len()
    }

    pub fn all_fit(&self) -> bool {
        self.unfit.is_empty()
    }

    /// Area available to the packer.
    pub fn usable_rect(&self) -> Rect {
        Rect::new(
            0,
            self.margin,
            self.page_width,
            self.page_height.saturating_sub(self.margin),
        )
    }

    pub fn stats(&self) -> SheetStats {
        let used_area: u64 = self.placements.iter().map(|p| p.frame.area()).sum();
        let usable_area = self.usable_rect().area();
        let occupancy = if usable_area > 0 {
            used_area as f64 / usable_area as f64
        } else {
            0.0
        };
        SheetStats {
            placed: self.placements.len(),
            unfit: self.unfit.len(),
            used_area,
            usable_area,
            occupancy,
        }
    }
}

impl SheetStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Unfit: {}, Occupancy: {:.2}%, Usable Area: {} px², Used Area: {} px²",
            self.placed,
            self.unfit,
            self.occupancy * 100.0,
            self.usable_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.usable_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.usable_area > 0 {
            (self.wasted_area() as f64 / self.usable_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
