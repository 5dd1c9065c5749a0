//! Tiny encoded images to stand in for photos and camera frames.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// An 8×8 PNG of a single colour. Different colours give different frames.
pub fn solid_png(rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb(rgb));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    bytes
}
