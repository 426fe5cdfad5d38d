//! Conversion between host interleaved pixels and per-channel planes.
//!
//! Hosts hand over interleaved samples normalized to `[0, 1]`. Only gray and
//! RGB data (optionally with a trailing alpha channel) are restorable; alpha
//! is never touched by the restoration and is passed through on merge.
use serde::{Deserialize, Serialize};

use crate::error::{area, RefocusError, Result};

use super::{ImageF64, ImageView};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl PixelLayout {
    /// Layout for an interleaved buffer with `channels` samples per pixel.
    pub fn from_channel_count(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(PixelLayout::Gray),
            2 => Ok(PixelLayout::GrayAlpha),
            3 => Ok(PixelLayout::Rgb),
            4 => Ok(PixelLayout::Rgba),
            n => Err(RefocusError::InvalidInput(format!(
                "unsupported pixel format with {n} channels (expected gray or RGB, optionally with alpha)"
            ))),
        }
    }

    /// Samples per interleaved pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::GrayAlpha => 2,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    /// Channels that are restored (alpha excluded).
    pub fn color_channels(self) -> usize {
        match self {
            PixelLayout::Gray | PixelLayout::GrayAlpha => 1,
            PixelLayout::Rgb | PixelLayout::Rgba => 3,
        }
    }
}

fn check_len(pixels: usize, width: usize, height: usize, layout: PixelLayout) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RefocusError::InvalidInput(format!(
            "empty image {width}x{height}"
        )));
    }
    let expected = area("interleaved pixels", width, height)?
        .checked_mul(layout.channels())
        .ok_or_else(|| RefocusError::InvalidInput(format!("{width}x{height} image is too large")))?;
    if pixels != expected {
        return Err(RefocusError::InvalidInput(format!(
            "{width}x{height} {layout:?} image needs {expected} samples, got {pixels}"
        )));
    }
    Ok(())
}

/// Split interleaved samples into one plane per colour channel.
pub fn split_interleaved(
    pixels: &[f64],
    width: usize,
    height: usize,
    layout: PixelLayout,
) -> Result<Vec<ImageF64>> {
    check_len(pixels.len(), width, height, layout)?;
    let step = layout.channels();
    let mut planes = Vec::with_capacity(layout.color_channels());
    for c in 0..layout.color_channels() {
        let mut plane = ImageF64::try_new(width, height)?;
        for (dst, px) in plane.data.iter_mut().zip(pixels.chunks_exact(step)) {
            *dst = px[c];
        }
        planes.push(plane);
    }
    Ok(planes)
}

/// Write planes back into interleaved samples, clamping to `[0, 1]`.
pub fn merge_interleaved(
    planes: &[ImageF64],
    pixels: &mut [f64],
    layout: PixelLayout,
) -> Result<()> {
    if planes.len() != layout.color_channels() {
        return Err(RefocusError::InvalidInput(format!(
            "{layout:?} needs {} planes, got {}",
            layout.color_channels(),
            planes.len()
        )));
    }
    let (w, h) = planes[0].dimensions();
    check_len(pixels.len(), w, h, layout)?;
    let step = layout.channels();
    for (c, plane) in planes.iter().enumerate() {
        let src = plane.as_slice().ok_or_else(|| {
            RefocusError::InvalidInput("plane rows are not contiguous".to_string())
        })?;
        if plane.dimensions() != (w, h) {
            return Err(RefocusError::InvalidInput(
                "planes differ in size".to_string(),
            ));
        }
        for (px, &v) in pixels.chunks_exact_mut(step).zip(src) {
            px[c] = v.clamp(0.0, 1.0);
        }
    }
    Ok(())
}
