use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::sizes::PagePreset;

/// How a source image is fitted into a target box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Crop to fill: no borders, may discard pixels.
    #[default]
    Cover,
    /// Fit inside: no cropping, pads with the background color.
    Contain,
}

impl FromStr for FitMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" | "crop" | "fill" => Ok(Self::Cover),
            "contain" | "fit" | "border" => Ok(Self::Contain),
            _ => Err(()),
        }
    }
}

/// Resampling filter used when scaling sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "linear" => Ok(Self::Triangle),
            "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(()),
        }
    }
}

/// Caption band geometry and colors. Ratios are relative to the item size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CaptionStyle {
    /// Band height as a fraction of the item height.
    #[serde(default = "default_band_ratio")]
    pub band_ratio: f32,
    /// Font pixel size as a fraction of the band height.
    #[serde(default = "default_font_ratio")]
    pub font_ratio: f32,
    /// Horizontal margin on each side of the text, as a fraction of the item width.
    #[serde(default = "default_side_margin_ratio")]
    pub side_margin_ratio: f32,
    /// Text narrower than this fraction of the available width gets stretched.
    #[serde(default = "default_stretch_threshold")]
    pub stretch_threshold: f32,
    /// Upper bound for the horizontal glyph scale.
    #[serde(default = "default_max_stretch")]
    pub max_stretch: f32,
    #[serde(default = "default_band_color")]
    pub band_color: [u8; 3],
    #[serde(default = "default_text_color")]
    pub text_color: [u8; 3],
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            band_ratio: default_band_ratio(),
            font_ratio: default_font_ratio(),
            side_margin_ratio: default_side_margin_ratio(),
            stretch_threshold: default_stretch_threshold(),
            max_stretch: default_max_stretch(),
            band_color: default_band_color(),
            text_color: default_text_color(),
        }
    }
}

/// Sheet and per-photo rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Page width in pixels.
    pub page_width: u32,
    /// Page height in pixels.
    pub page_height: u32,
    /// Top margin in pixels; the packer works on `page_height - margin`.
    pub margin: u32,
    /// Print density written into the JFIF header.
    #[serde(default = "default_dpi")]
    pub dpi: u16,
    /// JPEG quality (1..=100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Cut-guide stroke width around each placed photo (0 disables).
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    #[serde(default = "default_border_color")]
    pub border_color: [u8; 3],
    /// Page fill and the color transparent source pixels are flattened onto.
    #[serde(default = "default_background")]
    pub background: [u8; 3],
    #[serde(default = "default_filter")]
    pub filter: ResampleFilter,
    #[serde(default)]
    pub caption: CaptionStyle,
    /// Composite tiles on the rayon pool when feature "parallel" is on.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let (page_width, page_height) = PagePreset::A4.pixel_size(default_dpi());
        Self {
            page_width,
            page_height,
            margin: 60,
            dpi: default_dpi(),
            jpeg_quality: default_jpeg_quality(),
            border_width: default_border_width(),
            border_color: default_border_color(),
            background: default_background(),
            filter: default_filter(),
            caption: CaptionStyle::default(),
            parallel: false,
        }
    }
}

impl LayoutConfig {
    /// Width and height the packer works with.
    pub fn usable_size(&self) -> (u32, u32) {
        (self.page_width, self.page_height.saturating_sub(self.margin))
    }

    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Page dimensions are zero
    /// - The margin leaves no usable height
    /// - DPI, JPEG quality or caption ratios are out of range
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PrintSheetError;

        if self.page_width == 0 || self.page_height == 0 {
            return Err(PrintSheetError::InvalidDimensions {
                width: self.page_width,
                height: self.page_height,
            });
        }

        if self.margin >= self.page_height {
            return Err(PrintSheetError::InvalidConfig(format!(
                "margin ({}) leaves no usable height on a {}x{} page",
                self.margin, self.page_width, self.page_height
            )));
        }

        if self.dpi == 0 {
            return Err(PrintSheetError::InvalidConfig("dpi must be non-zero".into()));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PrintSheetError::InvalidConfig(format!(
                "jpeg_quality ({}) must be within 1..=100",
                self.jpeg_quality
            )));
        }

        let c = &self.caption;
        for (name, v) in [
            ("caption.band_ratio", c.band_ratio),
            ("caption.font_ratio", c.font_ratio),
            ("caption.stretch_threshold", c.stretch_threshold),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(PrintSheetError::InvalidConfig(format!(
                    "{name} ({v}) must be within (0, 1]"
                )));
            }
        }
        if !(c.side_margin_ratio >= 0.0 && c.side_margin_ratio < 0.5) {
            return Err(PrintSheetError::InvalidConfig(format!(
                "caption.side_margin_ratio ({}) must be within [0, 0.5)",
                c.side_margin_ratio
            )));
        }
        if !(c.max_stretch >= 1.0) {
            return Err(PrintSheetError::InvalidConfig(format!(
                "caption.max_stretch ({}) must be at least 1.0",
                c.max_stretch
            )));
        }

        Ok(())
    }
}

fn default_dpi() -> u16 {
    300
}
fn default_jpeg_quality() -> u8 {
    95
}
fn default_border_width() -> u32 {
    2
}
fn default_border_color() -> [u8; 3] {
    [0xCC, 0xCC, 0xCC]
}
fn default_background() -> [u8; 3] {
    [0xFF, 0xFF, 0xFF]
}
fn default_filter() -> ResampleFilter {
    ResampleFilter::Lanczos3
}
fn default_band_ratio() -> f32 {
    0.12
}
fn default_font_ratio() -> f32 {
    0.65
}
fn default_side_margin_ratio() -> f32 {
    0.05
}
fn default_stretch_threshold() -> f32 {
    0.95
}
fn default_max_stretch() -> f32 {
    2.5
}
fn default_band_color() -> [u8; 3] {
    [0xFF, 0xFF, 0xFF]
}
fn default_text_color() -> [u8; 3] {
    [0x00, 0x00, 0x00]
}

/// Builder for `LayoutConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn with_page_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.page_width = w;
        self.cfg.page_height = h;
        self
    }
    /// Sets the page size from a preset at the currently configured DPI.
    pub fn page(mut self, preset: PagePreset) -> Self {
        let (w, h) = preset.pixel_size(self.cfg.dpi);
        self.cfg.page_width = w;
        self.cfg.page_height = h;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn dpi(mut self, v: u16) -> Self {
        self.cfg.dpi = v;
        self
    }
    pub fn jpeg_quality(mut self, v: u8) -> Self {
        self.cfg.jpeg_quality = v;
        self
    }
    pub fn border_width(mut self, v: u32) -> Self {
        self.cfg.border_width = v;
        self
    }
    pub fn border_color(mut self, v: [u8; 3]) -> Self {
        self.cfg.border_color = v;
        self
    }
    pub fn background(mut self, v: [u8; 3]) -> Self {
        self.cfg.background = v;
        self
    }
    pub fn filter(mut self, v: ResampleFilter) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn caption(mut self, v: CaptionStyle) -> Self {
        self.cfg.caption = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

impl LayoutConfig {
    /// Create a fluent builder for `LayoutConfig`.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}
