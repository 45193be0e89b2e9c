use image::{DynamicImage, Rgb, RgbImage};
use print_sheet_core::density::{DensityUnit, read_density};
use print_sheet_core::PrintSheetError;
use print_sheet_core::prelude::*;

fn a4_config() -> LayoutConfig {
    // the fast filter keeps debug-build runtimes reasonable
    LayoutConfig::builder()
        .page(PagePreset::A4)
        .margin(60)
        .dpi(300)
        .filter(ResampleFilter::Triangle)
        .build()
}

fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
}

fn assert_disjoint(placements: &[PlacedItem]) {
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            assert!(
                !placements[i].frame.intersects(&placements[j].frame),
                "{:?} overlaps {:?}",
                placements[i],
                placements[j]
            );
        }
    }
}

#[test]
fn a4_default_page_size() {
    let cfg = LayoutConfig::default();
    assert_eq!((cfg.page_width, cfg.page_height), (2480, 3508));
    assert_eq!(cfg.margin, 60);
    assert_eq!(cfg.dpi, 300);
    assert_eq!(cfg.usable_size(), (2480, 3448));
}

#[test]
fn mixed_package_fits_on_a4() {
    let cfg = a4_config();
    let requests = vec![
        LayoutRequest::new(600, 600, 4),
        LayoutRequest::new(413, 531, 2),
        LayoutRequest::new(450, 450, 6),
    ];
    let layout = plan_layout(&requests, &cfg).expect("layout");
    assert_eq!(layout.placements.len(), 12);
    assert_eq!(layout.unfit_count(), 0);
    assert!(layout.all_fit());
    assert_disjoint(&layout.placements);

    // largest first: the four 600x600 copies occupy the top shelf
    for p in &layout.placements[..4] {
        assert_eq!(p.request, 0);
        assert_eq!(p.frame.y, 60);
    }

    // top shelf spans 2400px, centered on a 2480px page
    assert_eq!(layout.offset_x, 40);
    let page = Rect::new(0, 0, 2480, 3508);
    for p in &layout.placements {
        assert!(page.contains(&p.frame));
        assert!(p.frame.y >= 60);
    }
}

#[test]
fn overfull_request_reports_unfit() {
    let cfg = a4_config();
    let layout = plan_layout(&[LayoutRequest::new(600, 600, 50)], &cfg).expect("layout");
    assert!(layout.unfit_count() > 0);
    assert_eq!(layout.placements.len() + layout.unfit_count(), 50);
    // 4 per shelf, 5 shelves in 3448px
    assert_eq!(layout.placements.len(), 20);
    assert_disjoint(&layout.placements);
    let usable = layout.usable_rect();
    for p in &layout.placements {
        assert!(usable.contains(&p.frame), "{:?} outside usable area", p.frame);
    }
    let stats = layout.stats();
    assert_eq!(stats.placed, 20);
    assert_eq!(stats.unfit, 30);
    assert_eq!(stats.used_area, 20 * 600 * 600);
}

#[test]
fn unfit_items_keep_request_identity() {
    let cfg = LayoutConfig::builder()
        .with_page_dimensions(110, 110)
        .margin(10)
        .build();
    let requests = vec![LayoutRequest::new(50, 50, 3), LayoutRequest::new(60, 60, 1)];
    let layout = plan_layout(&requests, &cfg).expect("layout");
    // 60x60 goes first; one 50x50 fits beside it, the rest have no room
    assert_eq!(layout.placements[0].request, 1);
    assert_eq!(layout.unfit_count(), 2);
    for u in &layout.unfit {
        assert_eq!(u.request, 0);
        assert_eq!((u.width, u.height), (50, 50));
    }
}

#[test]
fn build_page_renders_and_stamps_density() {
    let cfg = a4_config();
    let red = PrintItem::new(solid(64, 64, [220, 20, 20]), 600, 600);
    let blue = PrintItem::new(solid(80, 100, [20, 20, 220]), 413, 531);
    let green = PrintItem::new(solid(50, 50, [20, 200, 20]), 450, 450);
    let requests = vec![
        PlacementRequest::new(red, 4),
        PlacementRequest::new(blue, 2),
        PlacementRequest::new(green, 6),
    ];
    let out = build_page(&requests, cfg).expect("build");
    assert_eq!(out.unfit_count(), 0);
    assert_eq!(out.raster.dimensions(), (2480, 3508));
    assert_disjoint(&out.layout.placements);

    let density = read_density(&out.jpeg).expect("jfif header");
    assert_eq!(density.unit, DensityUnit::PerInch);
    assert_eq!((density.x, density.y), (300, 300));

    // above the first shelf stays page white
    assert_eq!(out.raster.get_pixel(1240, 10).0, [255, 255, 255]);

    for p in &out.layout.placements {
        let f = p.frame;
        let center = out.raster.get_pixel(f.x + f.w / 2, f.y + f.h / 2).0;
        let expected = match p.request {
            0 => [220, 20, 20],
            1 => [20, 20, 220],
            _ => [20, 200, 20],
        };
        for c in 0..3 {
            assert!(
                (center[c] as i32 - expected[c] as i32).abs() <= 2,
                "request {} center {:?}",
                p.request,
                center
            );
        }
        // cut guide on the frame edge
        assert_eq!(out.raster.get_pixel(f.x, f.y + f.h / 2).0, [0xCC, 0xCC, 0xCC]);
        assert_eq!(out.raster.get_pixel(f.x + f.w - 1, f.y + f.h / 2).0, [0xCC, 0xCC, 0xCC]);
    }

    // the encoded page decodes back to the page size
    let decoded = image::load_from_memory(&out.jpeg).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (2480, 3508));
}

#[test]
fn build_page_keeps_going_when_copies_overflow() {
    let cfg = LayoutConfig::builder()
        .with_page_dimensions(400, 300)
        .margin(20)
        .filter(ResampleFilter::Nearest)
        .build();
    let item = PrintItem::new(solid(10, 10, [0, 0, 0]), 120, 120);
    let out = build_page(&[PlacementRequest::new(item, 10)], cfg).expect("build");
    // 3 per shelf, 2 shelves in 280px
    assert_eq!(out.layout.placements.len(), 6);
    assert_eq!(out.unfit_count(), 4);
    assert_disjoint(&out.layout.placements);
    assert_eq!(out.layout.offset_x, 20);
}

#[test]
fn captions_draw_a_white_band() {
    let cfg = LayoutConfig::builder()
        .with_page_dimensions(300, 300)
        .margin(0)
        .border_width(0)
        .filter(ResampleFilter::Nearest)
        .build();
    let item = PrintItem::new(solid(20, 20, [10, 10, 10]), 200, 200).with_caption("   ");
    let out = build_page(&[PlacementRequest::new(item, 1)], cfg).expect("build");
    let f = out.layout.placements[0].frame;
    // band is 12% of 200 = 24px tall, whitespace caption draws no text
    for y in (f.y + f.h - 24)..(f.y + f.h) {
        assert_eq!(out.raster.get_pixel(f.x + f.w / 2, y).0, [255, 255, 255]);
    }
    assert_eq!(out.raster.get_pixel(f.x + f.w / 2, f.y + f.h - 25).0, [10, 10, 10]);
}

#[test]
fn cancelled_run_produces_no_output() {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    let flag = Arc::new(AtomicBool::new(true));
    let item = PrintItem::new(solid(8, 8, [0, 0, 0]), 100, 100);
    let builder = SheetBuilder::new(
        LayoutConfig::builder()
            .with_page_dimensions(200, 200)
            .margin(0)
            .build(),
    )
    .with_cancel_flag(flag);
    let res = builder.build_page(&[PlacementRequest::new(item, 1)]);
    assert!(matches!(res, Err(PrintSheetError::Cancelled)));
}
