//! Text rendering needs a real font; these tests skip when none is installed.

use image::{DynamicImage, Rgb, RgbImage};
use print_sheet_core::caption::{CaptionFont, band_height, draw_caption};
use print_sheet_core::config::CaptionStyle;
use print_sheet_core::prelude::*;

fn dark_pixels(img: &RgbImage, y0: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in y0..img.height() {
        for x in 0..img.width() {
            if img.get_pixel(x, y).0[0] < 128 {
                out.push((x, y));
            }
        }
    }
    out
}

#[test]
fn text_is_drawn_inside_the_band() {
    let Some(font) = CaptionFont::discover() else {
        eprintln!("no system font found; skipping");
        return;
    };
    let style = CaptionStyle::default();
    let mut canvas = RgbImage::from_pixel(600, 600, Rgb([200, 30, 30]));
    draw_caption(&mut canvas, "juan dela cruz", Some(&font), &style);
    let band_y = 600 - band_height(600, &style);
    let ink = dark_pixels(&canvas, band_y);
    assert!(!ink.is_empty());
    // nothing above the band changed
    assert_eq!(canvas.get_pixel(300, band_y - 1).0, [200, 30, 30]);
    // text stays near the 5% side margins; glyph bearings may overhang a little
    let min_x = ink.iter().map(|p| p.0).min().unwrap();
    let max_x = ink.iter().map(|p| p.0).max().unwrap();
    assert!(min_x + 8 >= 30, "min_x {min_x}");
    assert!(max_x <= 570 + 8, "max_x {max_x}");
}

#[test]
fn short_text_is_stretched_and_centered() {
    let Some(font) = CaptionFont::discover() else {
        eprintln!("no system font found; skipping");
        return;
    };
    let style = CaptionStyle::default();
    let mut plain = RgbImage::from_pixel(600, 600, Rgb([255, 255, 255]));
    draw_caption(&mut plain, "AB", Some(&font), &style);
    let ink = dark_pixels(&plain, 0);
    let min_x = ink.iter().map(|p| p.0).min().unwrap();
    let max_x = ink.iter().map(|p| p.0).max().unwrap();
    let ink_w = max_x - min_x + 1;

    let px = (band_height(600, &style) as f32 * style.font_ratio).floor();
    let natural = font.measure("AB", px);
    assert!(
        ink_w as f32 > natural * 1.5,
        "ink {ink_w} vs natural {natural}"
    );
    let mid = (min_x + max_x) / 2;
    assert!((mid as i32 - 300).abs() <= 12, "mid {mid}");
}

#[test]
fn caption_is_upper_cased() {
    let Some(font) = CaptionFont::discover() else {
        eprintln!("no system font found; skipping");
        return;
    };
    let style = CaptionStyle::default();
    let mut lower = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
    let mut upper = lower.clone();
    draw_caption(&mut lower, "  maria  ", Some(&font), &style);
    draw_caption(&mut upper, "MARIA", Some(&font), &style);
    assert_eq!(lower, upper);
}

#[test]
fn sheet_with_font_draws_caption_text() {
    let Some(font) = CaptionFont::discover() else {
        eprintln!("no system font found; skipping");
        return;
    };
    let cfg = LayoutConfig::builder()
        .with_page_dimensions(500, 500)
        .margin(0)
        .border_width(0)
        .build();
    let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])));
    let item = PrintItem::new(photo, 400, 400).with_caption("Ana");
    let out = SheetBuilder::new(cfg)
        .with_font(font)
        .build_page(&[PlacementRequest::new(item, 1)])
        .expect("page");
    let frame = out.layout.placements[0].frame;
    let band_y = frame.y + frame.h - band_height(400, &CaptionStyle::default());
    let mut dark = 0;
    for y in band_y..frame.y + frame.h {
        for x in frame.x..frame.x + frame.w {
            let p = out.raster.get_pixel(x, y).0;
            if p[0] < 100 && p[1] < 100 && p[2] < 100 {
                dark += 1;
            }
        }
    }
    assert!(dark > 0);
}

#[test]
fn missing_font_file_is_an_error() {
    assert!(CaptionFont::from_path("/nonexistent/font.ttf").is_err());
    assert!(CaptionFont::from_bytes(b"not a font").is_err());
}
