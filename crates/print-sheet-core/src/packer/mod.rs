use serde::{Deserialize, Serialize};

pub mod guillotine;

pub use guillotine::GuillotinePacker;

/// Outcome of placing one rectangle.
///
/// `Unfit` is a normal, reportable result: the packer keeps going with the
/// remaining rectangles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum Placement {
    Placed { x: u32, y: u32 },
    Unfit,
}

impl Placement {
    pub fn is_placed(&self) -> bool {
        matches!(self, Placement::Placed { .. })
    }

    /// Top-left corner in packer coordinates, if placed.
    pub fn position(&self) -> Option<(u32, u32)> {
        match *self {
            Placement::Placed { x, y } => Some((x, y)),
            Placement::Unfit => None,
        }
    }
}
