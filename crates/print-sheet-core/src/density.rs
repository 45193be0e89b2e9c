//! JFIF density stamping.
//!
//! Rewrites the density fields of an existing JFIF `APP0` segment so print
//! software renders the page at its physical size. Only header bytes change;
//! the entropy-coded data is never touched. Streams without a JFIF segment are
//! left as they are.

use serde::{Deserialize, Serialize};
use tracing::debug;

const MARKER: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const TEM: u8 = 0x01;
const JFIF_ID: &[u8; 5] = b"JFIF\0";

// Offsets relative to the 0xFF of the APP0 marker.
const UNITS_OFFSET: usize = 11;
const X_DENSITY_OFFSET: usize = 12;
const Y_DENSITY_OFFSET: usize = 14;
const JFIF_MIN_LEN: usize = 16;

/// JFIF density units byte.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DensityUnit {
    /// Aspect ratio only.
    None,
    PerInch,
    PerCentimeter,
}

impl DensityUnit {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::PerInch),
            2 => Some(Self::PerCentimeter),
            _ => None,
        }
    }
}

/// Density as declared by a JFIF header.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Density {
    pub unit: DensityUnit,
    pub x: u16,
    pub y: u16,
}

/// What `stamp_density_in_place` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityOutcome {
    Stamped,
    /// No SOI marker; not a JPEG stream.
    NotJpeg,
    /// JPEG without a (reachable) JFIF APP0 segment.
    MissingJfif,
}

/// Walks the marker segments preceding the scan data and returns the offset of
/// the JFIF `APP0` marker, if any.
fn find_jfif(bytes: &[u8]) -> Option<usize> {
    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != MARKER {
            return None;
        }
        let marker = bytes[offset + 1];
        match marker {
            // fill byte
            MARKER => {
                offset += 1;
                continue;
            }
            SOS | EOI => return None,
            TEM | 0xD0..=0xD7 => {
                offset += 2;
                continue;
            }
            _ => {}
        }
        let len = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        if len < 2 {
            return None;
        }
        if marker == APP0
            && len >= JFIF_MIN_LEN - 2
            && offset + JFIF_MIN_LEN <= bytes.len()
            && &bytes[offset + 4..offset + 9] == JFIF_ID
        {
            return Some(offset);
        }
        offset += 2 + len;
    }
    None
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == MARKER && bytes[1] == SOI
}

/// Declares `dpi` dots per inch on both axes, mutating the header in place.
pub fn stamp_density_in_place(bytes: &mut [u8], dpi: u16) -> DensityOutcome {
    if !is_jpeg(bytes) {
        return DensityOutcome::NotJpeg;
    }
    let Some(at) = find_jfif(bytes) else {
        debug!("no JFIF APP0 segment; density left unchanged");
        return DensityOutcome::MissingJfif;
    };
    let d = dpi.to_be_bytes();
    bytes[at + UNITS_OFFSET] = 1;
    bytes[at + X_DENSITY_OFFSET..at + X_DENSITY_OFFSET + 2].copy_from_slice(&d);
    bytes[at + Y_DENSITY_OFFSET..at + Y_DENSITY_OFFSET + 2].copy_from_slice(&d);
    DensityOutcome::Stamped
}

/// Owned variant of [`stamp_density_in_place`]. Non-JPEG input and JPEGs
/// without a JFIF segment come back unchanged.
pub fn stamp_density(mut bytes: Vec<u8>, dpi: u16) -> Vec<u8> {
    stamp_density_in_place(&mut bytes, dpi);
    bytes
}

/// Reads the density declared in the JFIF header, if present.
pub fn read_density(bytes: &[u8]) -> Option<Density> {
    if !is_jpeg(bytes) {
        return None;
    }
    let at = find_jfif(bytes)?;
    let unit = DensityUnit::from_byte(bytes[at + UNITS_OFFSET])?;
    let x = u16::from_be_bytes([bytes[at + X_DENSITY_OFFSET], bytes[at + X_DENSITY_OFFSET + 1]]);
    let y = u16::from_be_bytes([bytes[at + Y_DENSITY_OFFSET], bytes[at + Y_DENSITY_OFFSET + 1]]);
    Some(Density { unit, x, y })
}
