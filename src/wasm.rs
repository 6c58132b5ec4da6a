use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::color::to_hex;
use crate::extract::PaletteExtractor;
use crate::raster::Orientation;

/// Extract a palette from encoded image bytes.
///
/// Returns an array of uppercase `RRGGBB` strings, most dominant first.
/// `orientation` is an EXIF orientation value (1..=8) overriding the one
/// stored in the image; other values fall back to the stored orientation.
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette_hex(
    input: Vec<u8>,
    count: usize,
    seed: Option<u32>,
    orientation: Option<u8>,
) -> Result<Array, JsValue> {
    let orientation = orientation.and_then(|v| Orientation::from_exif(v as u16));
    let raster = crate::decode(&input, orientation)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?;

    let palette = PaletteExtractor::new(count)
        .with_optional_seed(seed.map(u64::from))
        .palette(&raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let hex = Array::new();
    for color in palette {
        hex.push(&JsValue::from_str(&to_hex(color)));
    }
    Ok(hex)
}
