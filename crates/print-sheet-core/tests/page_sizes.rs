use print_sheet_core::sizes::{
    ID_PHOTO_SIZES, IdPhotoSize, PRINT_SIZES, PagePreset, PhysicalSize, inches_to_px, mm_to_px,
};

#[test]
fn page_presets_at_300_dpi() {
    assert_eq!(PagePreset::A4.pixel_size(300), (2480, 3508));
    assert_eq!(PagePreset::Short.pixel_size(300), (2550, 3300));
    assert_eq!(PagePreset::Long.pixel_size(300), (2550, 3900));
}

#[test]
fn page_presets_parse() {
    assert_eq!("A4".parse::<PagePreset>(), Ok(PagePreset::A4));
    assert_eq!("letter".parse::<PagePreset>(), Ok(PagePreset::Short));
    assert_eq!("long".parse::<PagePreset>(), Ok(PagePreset::Long));
    assert!("b5".parse::<PagePreset>().is_err());
}

#[test]
fn unit_conversions_round() {
    assert_eq!(inches_to_px(2.0, 300), 600);
    assert_eq!(inches_to_px(8.27, 300), 2481);
    assert_eq!(mm_to_px(25.4, 300), 300);
    assert_eq!(mm_to_px(35.0, 300), 413);
    assert_eq!(mm_to_px(45.0, 300), 531);
}

#[test]
fn id_photo_sizes() {
    assert_eq!(ID_PHOTO_SIZES.len(), 4);
    let passport = IdPhotoSize::from_code("Passport").expect("passport");
    assert_eq!((passport.width, passport.height), (413, 531));
    let two = IdPhotoSize::from_code("2x2").expect("2x2");
    assert_eq!((two.width, two.height), (600, 600));
    assert!(IdPhotoSize::from_code("3x3").is_none());
}

#[test]
fn print_sizes_are_portrait() {
    for s in PRINT_SIZES {
        assert!(s.width_in <= s.height_in, "{}", s.code);
        assert_eq!(PhysicalSize::from_code(s.code), Some(*s));
    }
    let r5 = PhysicalSize::from_code("5r").expect("5r");
    assert_eq!(r5.pixel_size(300), (1500, 2100));
    assert_eq!(r5.oriented_pixel_size(300, 4000, 3000), (2100, 1500));
    assert_eq!(r5.oriented_pixel_size(300, 3000, 4000), (1500, 2100));
}
