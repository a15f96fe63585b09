#![allow(dead_code)]

use std::io::{Cursor, Write};

use jean_o_type::{ActivationFunction, Layer, Matrix, ModelMetadata, Network};

/// Builds a zip in memory. Names ending in `/` become directory entries.
pub fn zip_bytes(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zw = zip::ZipWriter::new(&mut buf);
        let opts = zip::write::FileOptions::default();
        for (name, data) in files {
            if name.ends_with('/') {
                zw.add_directory(*name, opts).unwrap();
            } else {
                zw.start_file(*name, opts).unwrap();
                zw.write_all(data).unwrap();
            }
        }
        zw.finish().unwrap();
    }
    buf.into_inner()
}

/// Builds a gzipped tar in memory. Names are written as given, so `./x`
/// stays `./x`; names ending in `/` become directory entries.
pub fn tar_gz_bytes(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    {
        let mut builder = tar::Builder::new(&mut gz);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
            header.set_size(data.len() as u64);
            if name.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
            } else {
                header.set_mode(0o644);
            }
            header.set_cksum();
            builder.append(&header, data.as_slice()).unwrap();
        }
        builder.finish().unwrap();
    }
    gz.finish().unwrap()
}

/// A one-layer network whose output is exactly `biases`, whatever the input.
pub fn constant_network(input_size: usize, biases: &[f64]) -> Network {
    Network {
        layers: vec![Layer {
            size: biases.len(),
            weights: Matrix::zeros(input_size, biases.len()),
            biases: Matrix::row(biases.to_vec()),
            activator: ActivationFunction::Identity,
        }],
        metadata: None,
    }
}

pub fn with_labels(network: Network, labels: &[&str]) -> Network {
    network.with_metadata(ModelMetadata {
        output_labels: Some(labels.iter().map(|s| s.to_string()).collect()),
        ..Default::default()
    })
}

pub fn json(network: &Network) -> Vec<u8> {
    serde_json::to_vec(network).unwrap()
}

/// A PNG of the given size filled with one colour.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Values in one 224×224 RGB image.
pub const IMAGE_INPUT: usize = 224 * 224 * 3;
