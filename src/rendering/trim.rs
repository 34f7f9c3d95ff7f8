use super::backend::RenderedSurface;
use crate::error::{RenderError, TrimError};
use std::io::Cursor;

/// Surface cropped to its non-transparent pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// True when the crop removed at least one row or column.
    pub trimmed: bool,
}

/// Crop away fully transparent borders.
///
/// A surface with no opaque pixel at all is returned unchanged with
/// `trimmed == false`.
pub fn trim_transparent(surface: RenderedSurface) -> Result<TrimmedImage, TrimError> {
    let RenderedSurface { rgba, width, height } = surface;
    if width == 0 || height == 0 {
        return Err(TrimError::EmptySurface { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(TrimError::BufferMismatch {
            expected,
            actual: rgba.len(),
        });
    }

    let stride = width as usize * 4;
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for (y, row) in rgba.chunks_exact(stride).enumerate() {
        let mut opaque = row.chunks_exact(4).enumerate().filter(|(_, px)| px[3] > 0).map(|(x, _)| x);
        let Some(first) = opaque.next() else {
            continue;
        };
        let last = opaque.last().unwrap_or(first);
        bounds = Some(match bounds {
            None => (first, y, last, y),
            Some((left, top, right, _)) => (left.min(first), top, right.max(last), y),
        });
    }

    let Some((left, top, right, bottom)) = bounds else {
        return Ok(TrimmedImage {
            rgba,
            width,
            height,
            trimmed: false,
        });
    };

    let new_width = right - left + 1;
    let new_height = bottom - top + 1;
    if new_width == width as usize && new_height == height as usize {
        return Ok(TrimmedImage {
            rgba,
            width,
            height,
            trimmed: false,
        });
    }

    let mut cropped = Vec::with_capacity(new_width * new_height * 4);
    for row in rgba.chunks_exact(stride).skip(top).take(new_height) {
        cropped.extend_from_slice(&row[left * 4..(right + 1) * 4]);
    }

    Ok(TrimmedImage {
        rgba: cropped,
        width: new_width as u32,
        height: new_height as u32,
        trimmed: true,
    })
}

/// Encode as an RGBA PNG, then re-compress with oxipng.
///
/// Falls back to the fast encoding when optimization fails.
pub fn encode_png(image: &TrimmedImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&image.rgba)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    let png_bytes = buf.into_inner();

    let optimized = oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            optimize_alpha: true,
            ..Default::default()
        },
    );
    match optimized {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "PNG optimization failed, keeping fast encoding");
            Ok(png_bytes)
        }
    }
}
