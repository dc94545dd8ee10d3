use super::MaterialParams;

/// Shortest run that can be reported; runs must be strictly longer.
const MIN_STRING_RUN: usize = 3;

/// Floats outside this window are never treated as material scalars.
const SCALAR_WINDOW: (f32, f32) = (0.1, 20.0);
const DETAIL_SCALE_RANGE: (f32, f32) = (4.0, 8.0);
const NORMAL_STRENGTH_RANGE: (f32, f32) = (0.5, 2.0);

fn in_range(value: f32, (lo, hi): (f32, f32)) -> bool {
    lo <= value && value <= hi
}

fn is_printable(byte: u8) -> bool {
    (32..=126).contains(&byte)
}

fn looks_like_path(run: &[u8]) -> bool {
    run.len() > MIN_STRING_RUN && run.iter().any(|&b| matches!(b, b'/' | b'\\' | b'.'))
}

/// Collect printable-ASCII runs that look like file paths.
///
/// A run ends at any non-printable byte or at the end of the buffer, and is
/// kept when it is longer than three bytes and contains `/`, `\` or `.`.
pub fn extract_path_strings(data: &[u8]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut start = None;

    for (i, &byte) in data.iter().enumerate() {
        if is_printable(byte) {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            push_run(&data[s..i], &mut strings);
        }
    }
    if let Some(s) = start {
        push_run(&data[s..], &mut strings);
    }

    strings
}

fn push_run(run: &[u8], out: &mut Vec<String>) {
    if looks_like_path(run) {
        // Printable ASCII is always valid UTF-8.
        out.push(String::from_utf8_lossy(run).into_owned());
    }
}

/// Scan every 4-byte window (any alignment) for plausible material scalars.
///
/// Later matches overwrite earlier ones. `specular_level` has no scan rule
/// and always keeps its default.
pub fn scan_material_params(data: &[u8]) -> MaterialParams {
    let mut params = MaterialParams::default();

    for window in data.windows(4) {
        let value = f32::from_le_bytes([window[0], window[1], window[2], window[3]]);
        if !in_range(value, SCALAR_WINDOW) {
            continue;
        }
        if in_range(value, DETAIL_SCALE_RANGE) {
            params.detail_scale = value;
        } else if in_range(value, NORMAL_STRENGTH_RANGE) {
            params.normal_strength = value;
        }
    }

    params
}
