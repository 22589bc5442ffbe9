//! Fuzz target for annotation file parsing.
//!
//! Parsed records are also rebuilt into shapes, which exercises mask
//! reconstruction for arbitrary stored runs and points.
//!
//! Run with:
//!   cargo +nightly fuzz run annotation_json_parse

#![no_main]

use annotool::workspace::io_json::from_json_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(record) = from_json_slice(data) {
        for shape in record.shapes.unwrap_or_default() {
            // Stored mask sizes are untrusted; skip ones that would allocate gigabytes.
            if let Some(mask) = &shape.mask {
                if u64::from(mask.width) * u64::from(mask.height) > 1 << 24 {
                    continue;
                }
            }
            let _ = shape.into_shape((4096, 4096));
        }
    }
});
