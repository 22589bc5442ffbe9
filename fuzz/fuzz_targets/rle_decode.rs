//! Fuzz target for the column-major RLE decoder.
//!
//! The first four bytes pick the mask size; the rest are run lengths.
//! Decoding must never panic, whatever the runs add up to, and a
//! re-encode of the result must describe the same mask.
//!
//! Run with:
//!   cargo +nightly fuzz run rle_decode

#![no_main]

use annotool::mask::rle::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let height = u32::from(u16::from_le_bytes([data[0], data[1]]) % 512);
    let width = u32::from(u16::from_le_bytes([data[2], data[3]]) % 512);
    let counts: Vec<u32> = data[4..]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mask = decode(&counts, height, width);
    assert_eq!((mask.width(), mask.height()), (width, height));
    assert_eq!(decode(&encode(&mask), height, width), mask);
});
