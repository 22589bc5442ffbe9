#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use annotool::inference::{ProcessorConfig, RawOutput};
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, Axis};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes a mid-gray PNG with a brighter square in the top-left quarter.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let image = RgbImage::from_fn(width, height, |x, y| {
        if x < width / 2 && y < height / 2 {
            Rgb([200, 200, 200])
        } else {
            Rgb([90, 90, 90])
        }
    });
    image.save(path).expect("write png file");
}

/// Creates `<dir>/<name>` as a `width x height` PNG and returns its path.
pub fn image_in(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    write_png(&path, width, height);
    path
}

/// Tensors for a 64x64 network with two classes, two mask coefficients and
/// a 16x16 prototype grid.
///
/// Letterboxing a 128x64 image into 64x64 gives scale 0.5 and 16 rows of
/// top padding, so the two detections land at image boxes (48, 24, 32, 16)
/// (class 0, confidence 0.9) and (24, 8, 16, 16) (class 1, confidence 0.6).
/// A third candidate overlaps the first with lower confidence and is
/// suppressed; a fourth is below every threshold used in the tests.
pub fn synthetic_output() -> RawOutput {
    let columns: [[f32; 8]; 4] = [
        [32.0, 32.0, 16.0, 8.0, 0.9, 0.0, 1.0, 0.0],
        [16.0, 24.0, 8.0, 8.0, 0.1, 0.6, 1.0, 0.0],
        [33.0, 32.0, 16.0, 8.0, 0.8, 0.0, 1.0, 0.0],
        [50.0, 50.0, 4.0, 4.0, 0.02, 0.01, 1.0, 0.0],
    ];
    let mut detections = Array2::<f32>::zeros((8, columns.len()));
    for (col, values) in columns.iter().enumerate() {
        for (row, &v) in values.iter().enumerate() {
            detections[[row, col]] = v;
        }
    }

    let mut prototypes = Array3::<f32>::zeros((2, 16, 16));
    prototypes.index_axis_mut(Axis(0), 0).fill(1.0);
    prototypes.index_axis_mut(Axis(0), 1).fill(-1.0);

    RawOutput::new(detections, prototypes)
}

pub fn synthetic_config() -> ProcessorConfig {
    ProcessorConfig {
        input_width: 64,
        input_height: 64,
        mask_coefficients: 2,
        confidence_threshold: 0.25,
        nms_threshold: 0.5,
        ..ProcessorConfig::default()
    }
    .with_names(["G-", "B+"])
}

/// Writes [`synthetic_output`] as `det.npy` and `proto.npy` (with a leading
/// batch axis) and a matching `config.yaml`; returns the three paths.
pub fn write_synthetic_inputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let output = synthetic_output();
    let det_path = dir.join("det.npy");
    let proto_path = dir.join("proto.npy");
    let config_path = dir.join("config.yaml");

    let det = output.detections.insert_axis(Axis(0));
    let proto = output.prototypes.insert_axis(Axis(0));
    ndarray_npy::write_npy(&det_path, &det).expect("write detections");
    ndarray_npy::write_npy(&proto_path, &proto).expect("write prototypes");

    let yaml = serde_yaml::to_string(&synthetic_config()).expect("serialize config");
    fs::write(&config_path, yaml).expect("write config");

    (det_path, proto_path, config_path)
}
