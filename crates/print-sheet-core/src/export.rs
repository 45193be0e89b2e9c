use crate::model::SheetLayout;
use serde_json::{Value, json};

/// Serialize a `SheetLayout` as `{ page, placements, unfit, stats }`.
/// Frame coordinates are page pixels; `page.widthMm`/`heightMm` give the
/// physical size implied by the declared DPI.
pub fn to_json(layout: &SheetLayout) -> Value {
    let mm = |px: u32| px as f64 * 25.4 / layout.dpi as f64;
    let placements: Vec<Value> = layout
        .placements
        .iter()
        .map(|p| {
            json!({
                "request": p.request,
                "copy": p.copy,
                "frame": {"x": p.frame.x, "y": p.frame.y, "w": p.frame.w, "h": p.frame.h},
            })
        })
        .collect();
    let unfit: Vec<Value> = layout
        .unfit
        .iter()
        .map(|u| json!({"request": u.request, "copy": u.copy, "w": u.width, "h": u.height}))
        .collect();
    json!({
        "page": {
            "width": layout.page_width,
            "height": layout.page_height,
            "margin": layout.margin,
            "dpi": layout.dpi,
            "offsetX": layout.offset_x,
            "widthMm": mm(layout.page_width),
            "heightMm": mm(layout.page_height),
        },
        "placements": placements,
        "unfit": unfit,
        "stats": layout.stats(),
    })
}
