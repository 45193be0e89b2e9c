//! Core library for laying out photo prints on a single page.
//!
//! - Packing: first-fit guillotine tree (`GuillotinePacker`), largest area first
//! - Compositing: "cover" crop-to-fill with optional caption band, "contain" fit with border
//! - Density: JFIF DPI stamping on the encoded page, no recompression
//! - Pipeline: `SheetBuilder::build_page` returns the page, its JPEG bytes and the copies that did not fit
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use print_sheet_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let photo = ImageReader::open("me.png")?.decode()?;
//! let item = PrintItem::new(photo, 600, 600).with_caption("Juan Dela Cruz");
//! let requests = vec![PlacementRequest::new(item, 4)];
//! let out = SheetBuilder::new(LayoutConfig::default()).build_page(&requests)?;
//! std::fs::write("sheet.jpg", &out.jpeg)?;
//! println!("unfit: {}", out.unfit_count());
//! # Ok(()) }
//! ```

pub mod caption;
pub mod compositing;
pub mod config;
pub mod density;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod sizes;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `print_sheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::caption::CaptionFont;
    pub use crate::compositing::Compositor;
    pub use crate::config::{
        CaptionStyle, FitMode, LayoutConfig, LayoutConfigBuilder, ResampleFilter,
    };
    pub use crate::density::{Density, DensityUnit, read_density, stamp_density};
    pub use crate::model::{
        LayoutRequest, PlacedItem, PlacementRequest, PrintItem, Rect, SheetLayout, SheetStats,
        UnfitItem,
    };
    pub use crate::packer::{GuillotinePacker, Placement};
    pub use crate::sizes::{IdPhotoSize, PagePreset, PhysicalSize};
    pub use crate::{
        ResizeOutput, SheetBuilder, SheetOutput, build_page, plan_layout, resize_photo,
    };
}
