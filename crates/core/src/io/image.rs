//! Plain image formats (png/jpg/bmp/gif) via the `image` crate
//!
//! Plain images carry no georeferencing of their own, so a world file
//! sidecar is mandatory on read and always written on save. Without a
//! sidecar the image is rejected rather than loaded unpositioned.

use crate::error::{Error, Result};
use crate::io::worldfile;
use crate::raster::{Band, Raster, RasterElement};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use std::path::Path;

/// Read a geopositioned plain image into a raster.
///
/// Grayscale images load as one band, RGB as three, images with alpha as
/// four. Sample values are cast from u8.
pub fn read_image<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let sidecar = worldfile::sidecar_for(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            "{}: plain image without a world file cannot be geopositioned",
            path.display()
        ))
    })?;
    let transform = worldfile::read_world_file(&sidecar)?;

    let img = image::open(path)
        .map_err(|e| Error::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;

    let (interleaved, samples, width, height) = match img {
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            (gray.into_raw(), 1, w, h)
        }
        other if other.color().has_alpha() => {
            let rgba = other.to_rgba8();
            let (w, h) = rgba.dimensions();
            (rgba.into_raw(), 4, w, h)
        }
        other => {
            let rgb = other.to_rgb8();
            let (w, h) = rgb.dimensions();
            (rgb.into_raw(), 3, w, h)
        }
    };

    let rows = height as usize;
    let cols = width as usize;
    let bands = (0..samples)
        .map(|s| {
            let data: Vec<T> = interleaved
                .iter()
                .skip(s)
                .step_by(samples)
                .map(|&v| T::from_f64(v as f64).unwrap_or_else(T::cast_fallback))
                .collect();
            Band::from_vec(data, rows, cols)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut raster = Raster::from_bands(bands)?;
    raster.set_transform(transform);
    Ok(raster)
}

/// Save a raster as a plain image plus a world file sidecar.
///
/// One band saves as grayscale, three as RGB, four as RGBA; two or more
/// than four bands cannot be combined into a single image and must be
/// split and saved per band.
pub fn write_image<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let (rows, cols) = raster.shape();
    let (w, h) = (cols as u32, rows as u32);

    let img: DynamicImage = match raster.band_count() {
        1 => {
            let buf = sample_bytes(raster, 1)?;
            GrayImage::from_raw(w, h, buf)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| Error::Other("image buffer size mismatch".to_string()))?
        }
        3 => {
            let buf = sample_bytes(raster, 3)?;
            RgbImage::from_raw(w, h, buf)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::Other("image buffer size mismatch".to_string()))?
        }
        4 => {
            let buf = sample_bytes(raster, 4)?;
            RgbaImage::from_raw(w, h, buf)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| Error::Other("image buffer size mismatch".to_string()))?
        }
        count => return Err(Error::BandCount { count }),
    };

    img.save(path)
        .map_err(|e| Error::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;
    worldfile::write_world_file(&worldfile::sidecar_path(path), raster.transform())?;
    Ok(())
}

fn sample_bytes<T: RasterElement>(raster: &Raster<T>, samples: usize) -> Result<Vec<u8>> {
    let (rows, cols) = raster.shape();
    let mut data = vec![0u8; rows * cols * samples];
    for s in 0..samples {
        let band = raster.band(s)?;
        for (i, &v) in band.iter().enumerate() {
            data[i * samples + s] = num_traits::cast(v).unwrap_or(0);
        }
    }
    Ok(data)
}
