//! I/O helpers for restoration planes and JSON.
//!
//! - `load_planes`: read a PNG/JPEG into one `[0, 1]` plane per colour channel.
//! - `save_planes`: write one (gray) or three (RGB) planes to disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF64, ImageView, PixelLayout};
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Planes decoded from an image file together with their layout.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub layout: PixelLayout,
    pub planes: Vec<ImageF64>,
}

impl LoadedImage {
    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.planes.first().map_or(0, |p| p.w)
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.planes.first().map_or(0, |p| p.h)
    }
}

/// Load an image from disk; colour images become three planes, everything
/// else a single gray plane. Alpha is dropped.
pub fn load_planes(path: &Path) -> Result<LoadedImage, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    if img.color().has_color() {
        let rgb = img.into_rgb8();
        let mut planes = vec![ImageF64::new(w, h); 3];
        for (idx, px) in rgb.pixels().enumerate() {
            for (c, plane) in planes.iter_mut().enumerate() {
                plane.data[idx] = px[c] as f64 / 255.0;
            }
        }
        Ok(LoadedImage {
            layout: PixelLayout::Rgb,
            planes,
        })
    } else {
        let gray = img.into_luma8();
        let mut plane = ImageF64::new(w, h);
        for (dst, px) in plane.data.iter_mut().zip(gray.pixels()) {
            *dst = px[0] as f64 / 255.0;
        }
        Ok(LoadedImage {
            layout: PixelLayout::Gray,
            planes: vec![plane],
        })
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Save one gray plane or three RGB planes, clamping samples to `[0, 1]`.
pub fn save_planes(planes: &[ImageF64], path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    match planes {
        [gray] => {
            let mut out = GrayImage::new(gray.w as u32, gray.h as u32);
            for (y, row) in gray.rows().enumerate() {
                for (x, &v) in row.iter().enumerate() {
                    out.put_pixel(x as u32, y as u32, Luma([to_u8(v)]));
                }
            }
            out.save(path)
                .map_err(|e| format!("Failed to save {}: {e}", path.display()))
        }
        [r, g, b] => {
            if !(r.same_shape(g) && r.same_shape(b)) {
                return Err(format!(
                    "Failed to save {}: planes differ in size",
                    path.display()
                ));
            }
            let mut out = RgbImage::new(r.w as u32, r.h as u32);
            for y in 0..r.h {
                let (rr, gr, br) = (r.row(y), g.row(y), b.row(y));
                for x in 0..r.w {
                    out.put_pixel(
                        x as u32,
                        y as u32,
                        Rgb([to_u8(rr[x]), to_u8(gr[x]), to_u8(br[x])]),
                    );
                }
            }
            out.save(path)
                .map_err(|e| format!("Failed to save {}: {e}", path.display()))
        }
        other => Err(format!(
            "Failed to save {}: expected 1 or 3 planes, got {}",
            path.display(),
            other.len()
        )),
    }
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
