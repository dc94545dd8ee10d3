//! Heuristic decoder for the undocumented `.bin` model descriptor.
//!
//! The format has no public schema, so nothing here is validated. The blob
//! is scanned for path-like ASCII strings and for floats that fall in the
//! plausible range of a known material scalar.

mod scan;

pub use scan::{extract_path_strings, scan_material_params};

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// File extension of descriptor blobs.
pub const DESCRIPTOR_EXTENSION: &str = "bin";

/// Scalar material parameters recovered from a descriptor.
///
/// Every field is either a value seen inside its plausible range or the
/// default; an out-of-range value is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    /// Detail texture tiling, plausible range [4.0, 8.0].
    pub detail_scale: f32,
    /// Plausible range [0.5, 2.0].
    pub normal_strength: f32,
    pub specular_level: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            detail_scale: 6.0,
            normal_strength: 1.0,
            specular_level: 0.5,
        }
    }
}

/// Best-effort structured view of a descriptor blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// First four bytes as little-endian u32. Not validated.
    pub magic: Option<u32>,
    pub texture_paths: Vec<String>,
    pub material_params: MaterialParams,
}

/// Decode a raw descriptor buffer. Never fails; an empty or garbage buffer
/// yields the all-default descriptor.
pub fn decode_descriptor(data: &[u8]) -> Descriptor {
    let magic = data
        .get(..4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));

    Descriptor {
        magic,
        texture_paths: extract_path_strings(data),
        material_params: scan_material_params(data),
    }
}

/// Read and decode a descriptor file. An unreadable file degrades to the
/// default descriptor with a warning.
pub fn read_descriptor_file(path: &Path) -> Descriptor {
    match std::fs::read(path) {
        Ok(data) => {
            let descriptor = decode_descriptor(&data);
            debug!(
                "Decoded {} ({} bytes): magic={:?}, {} path strings, {:?}",
                path.display(),
                data.len(),
                descriptor.magic,
                descriptor.texture_paths.len(),
                descriptor.material_params
            );
            descriptor
        }
        Err(e) => {
            warn!(
                "Failed to read descriptor {}: {}; using defaults",
                path.display(),
                e
            );
            Descriptor::default()
        }
    }
}
