//! Named print and page sizes.
//!
//! ID photo sizes are fixed pixel boxes at 300 DPI; physical print sizes are in
//! inches and converted with the configured DPI.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MM_PER_INCH: f64 = 25.4;

/// Converts a physical length to whole pixels at `dpi`.
pub fn inches_to_px(inches: f64, dpi: u16) -> u32 {
    (inches * dpi as f64).round().max(1.0) as u32
}

pub fn mm_to_px(mm: f64, dpi: u16) -> u32 {
    inches_to_px(mm / MM_PER_INCH, dpi)
}

/// Output page presets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PagePreset {
    /// ISO A4, 210 x 297 mm.
    A4,
    /// US letter ("short bond"), 8.5 x 11 in.
    Short,
    /// Legal-folio ("long bond"), 8.5 x 13 in.
    Long,
}

impl PagePreset {
    /// Physical size in millimetres (width, height).
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Short => (8.5 * MM_PER_INCH, 11.0 * MM_PER_INCH),
            Self::Long => (8.5 * MM_PER_INCH, 13.0 * MM_PER_INCH),
        }
    }

    /// Page size in pixels at `dpi`; A4 at 300 DPI is 2480x3508.
    pub fn pixel_size(self, dpi: u16) -> (u32, u32) {
        let (w, h) = self.size_mm();
        (mm_to_px(w, dpi), mm_to_px(h, dpi))
    }
}

impl FromStr for PagePreset {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "short" | "letter" => Ok(Self::Short),
            "long" | "folio" => Ok(Self::Long),
            _ => Err(()),
        }
    }
}

/// Fixed pixel sizes for ID photo packages (300 DPI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPhotoSize {
    pub code: &'static str,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const ID_PHOTO_SIZES: &[IdPhotoSize] = &[
    IdPhotoSize { code: "2x2", label: "2x2\"", width: 600, height: 600 },
    IdPhotoSize { code: "passport", label: "Passport (35x45mm)", width: 413, height: 531 },
    IdPhotoSize { code: "1.5x1.5", label: "1.5x1.5\"", width: 450, height: 450 },
    IdPhotoSize { code: "1x1", label: "1x1\"", width: 300, height: 300 },
];

impl IdPhotoSize {
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_ascii_lowercase();
        ID_PHOTO_SIZES.iter().copied().find(|s| s.code == code)
    }
}

/// Physical print sizes used by the batch resize path (portrait orientation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSize {
    pub code: &'static str,
    pub label: &'static str,
    pub width_in: f64,
    pub height_in: f64,
}

pub const PRINT_SIZES: &[PhysicalSize] = &[
    PhysicalSize { code: "cute", label: "Cute Size (2x3\")", width_in: 2.0, height_in: 3.0 },
    PhysicalSize { code: "wallet", label: "Wallet Size (2.5x3.5\")", width_in: 2.5, height_in: 3.5 },
    PhysicalSize { code: "3r", label: "3R (3.5x5\")", width_in: 3.5, height_in: 5.0 },
    PhysicalSize { code: "4r", label: "4R (4x6\")", width_in: 4.0, height_in: 6.0 },
    PhysicalSize { code: "5r", label: "5R (5x7\")", width_in: 5.0, height_in: 7.0 },
    PhysicalSize { code: "8r", label: "8R (8x10\")", width_in: 8.0, height_in: 10.0 },
    PhysicalSize { code: "a4", label: "A4 (8.27x11.69\")", width_in: 8.27, height_in: 11.69 },
    PhysicalSize { code: "short", label: "Short (8.5x11\")", width_in: 8.5, height_in: 11.0 },
    PhysicalSize { code: "long", label: "Long (8.5x13\")", width_in: 8.5, height_in: 13.0 },
];

impl PhysicalSize {
    pub fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            code: "custom",
            label: "Custom",
            width_in,
            height_in,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_ascii_lowercase();
        PRINT_SIZES.iter().copied().find(|s| s.code == code)
    }

    /// Pixel size at `dpi`, as listed (no orientation swap).
    pub fn pixel_size(&self, dpi: u16) -> (u32, u32) {
        (inches_to_px(self.width_in, dpi), inches_to_px(self.height_in, dpi))
    }

    /// Pixel size at `dpi`, rotated to follow the source orientation:
    /// landscape sources get a landscape box, portrait and square sources a
    /// portrait one.
    pub fn oriented_pixel_size(&self, dpi: u16, src_w: u32, src_h: u32) -> (u32, u32) {
        let (w, h) = self.pixel_size(dpi);
        let landscape = src_w > src_h;
        if (landscape && w < h) || (!landscape && w > h) {
            (h, w)
        } else {
            (w, h)
        }
    }
}
