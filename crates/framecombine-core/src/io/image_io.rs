use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Luma};
use ndarray::{Array2, ArrayView2};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tracing::debug;

use crate::combine::{CombineResult, OutputChannel};
use crate::consts::{MAX_COUNT_PIXEL, OUTPUT_CHANNELS};
use crate::error::{CombineError, Result};

/// Load a grayscale image as `f32` samples.
///
/// Single-channel float TIFFs are read as stored. Integer images of any
/// format the `image` crate reads are converted to luminance and scaled to
/// [0.0, 1.0].
pub fn load_image(path: &Path) -> Result<Array2<f32>> {
    let gray_tiff = if is_tiff(path) {
        load_gray_tiff(path)?
    } else {
        None
    };
    let data = match gray_tiff {
        Some(data) => data,
        None => load_luma16(path)?,
    };
    let (h, w) = data.dim();
    debug!(path = %path.display(), width = w, height = h, "Loaded frame");
    Ok(data)
}

/// Load a mask image. Any nonzero pixel marks the sample as excluded.
pub fn load_mask(path: &Path) -> Result<Array2<bool>> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    let mask = sample_grid(w, h, gray.into_raw(), |v| v != 0)?;

    debug!(
        path = %path.display(),
        masked = mask.iter().filter(|&&m| m).count(),
        "Loaded mask"
    );
    Ok(mask)
}

/// Save a value or variance channel.
///
/// TIFF output is 32-bit float and stores every sample exactly. PNG output
/// is 16-bit and only accepts samples in [0.0, 1.0]; anything else is an
/// error rather than being clipped.
pub fn save_image(data: &ArrayView2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    if is_png(path) {
        if let Some(bad) = data.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(CombineError::InvalidParameter(format!(
                "sample {bad} is outside [0, 1] and cannot be stored in 16-bit PNG {}; use TIFF",
                path.display()
            )));
        }
        let pixels = data.iter().map(|&v| (v * 65535.0).round() as u16).collect();
        write_png16(pixels, w, h, path)
    } else {
        let samples: Vec<f32> = data.iter().copied().collect();
        write_tiff::<colortype::Gray32Float>(&samples, w, h, path)
    }
}

/// Save a count map. TIFF stores raw 32-bit counts; PNG saturates at 65535.
pub fn save_count(counts: &ArrayView2<u32>, path: &Path) -> Result<()> {
    let (h, w) = counts.dim();
    if is_png(path) {
        let pixels = counts
            .iter()
            .map(|&c| c.min(MAX_COUNT_PIXEL) as u16)
            .collect();
        write_png16(pixels, w, h, path)
    } else {
        let samples: Vec<u32> = counts.iter().copied().collect();
        write_tiff::<colortype::Gray32>(&samples, w, h, path)
    }
}

/// Path of one output channel: `<prefix>_<channel>.<ext>`.
pub fn channel_path(prefix: &Path, channel: OutputChannel, ext: &str) -> PathBuf {
    let stem = prefix
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    prefix.with_file_name(format!("{stem}_{}.{ext}", channel.name()))
}

/// Save all output channels of a 2-D result next to `prefix`.
pub fn save_result(
    result: &CombineResult<ndarray::Ix2>,
    prefix: &Path,
    ext: &str,
) -> Result<[PathBuf; OUTPUT_CHANNELS]> {
    let paths = OutputChannel::ALL.map(|channel| channel_path(prefix, channel, ext));
    for (channel, path) in OutputChannel::ALL.iter().zip(&paths) {
        match channel {
            OutputChannel::Value => save_image(&result.value.view(), path)?,
            OutputChannel::Variance => save_image(&result.variance.view(), path)?,
            OutputChannel::Count => save_count(&result.count.view(), path)?,
        }
    }
    Ok(paths)
}

fn extension_is(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| candidates.iter().any(|c| e.eq_ignore_ascii_case(c)))
}

fn is_tiff(path: &Path) -> bool {
    extension_is(path, &["tif", "tiff"])
}

fn is_png(path: &Path) -> bool {
    extension_is(path, &["png"])
}

/// Row-major `h x w` grid from a flat sample buffer.
fn sample_grid<T, U>(
    w: u32,
    h: u32,
    samples: Vec<T>,
    convert: impl Fn(T) -> U,
) -> Result<Array2<U>> {
    let len = samples.len();
    let converted: Vec<U> = samples.into_iter().map(convert).collect();
    Array2::from_shape_vec((h as usize, w as usize), converted).map_err(|_| {
        CombineError::InvalidParameter(format!("{len} samples do not fill a {w}x{h} image"))
    })
}

fn load_luma16(path: &Path) -> Result<Array2<f32>> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    sample_grid(w, h, gray.into_raw(), |v| v as f32 / 65535.0)
}

/// Single-channel TIFF, or `None` when the file needs the generic loader.
fn load_gray_tiff(path: &Path) -> Result<Option<Array2<f32>>> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    if !matches!(decoder.colortype()?, tiff::ColorType::Gray(_)) {
        return Ok(None);
    }
    let (w, h) = decoder.dimensions()?;
    let data = match decoder.read_image()? {
        DecodingResult::U8(buf) => sample_grid(w, h, buf, |v| v as f32 / 255.0)?,
        DecodingResult::U16(buf) => sample_grid(w, h, buf, |v| v as f32 / 65535.0)?,
        DecodingResult::F32(buf) => sample_grid(w, h, buf, |v| v)?,
        _ => return Ok(None),
    };
    Ok(Some(data))
}

fn write_tiff<C>(samples: &[C::Inner], w: usize, h: usize, path: &Path) -> Result<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut file = BufWriter::new(File::create(path)?);
    TiffEncoder::new(&mut file)?.write_image::<C>(w as u32, h as u32, samples)?;
    file.flush()?;
    debug!(path = %path.display(), "Saved TIFF");
    Ok(())
}

fn write_png16(pixels: Vec<u16>, w: usize, h: usize, path: &Path) -> Result<()> {
    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| {
            CombineError::InvalidParameter(format!("pixel buffer does not match {w}x{h}"))
        })?;
    img.save_with_format(path, ImageFormat::Png)?;
    debug!(path = %path.display(), "Saved PNG");
    Ok(())
}
