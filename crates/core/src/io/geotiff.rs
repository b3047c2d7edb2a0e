//! GeoTIFF reading and writing via the `tiff` crate
//!
//! Georeferencing is resolved in precedence order: the
//! `ModelTransformationTag` (34264) wins over `ModelPixelScaleTag` (33550)
//! + `ModelTiepointTag` (33922); with no GeoTIFF tags at all, a sibling
//! world file is tried; with neither, the load fails. A load error never
//! leaves a partially-populated raster behind.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::io::worldfile;
use crate::raster::{Band, CellAnchor, GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, RGB8, RGBA8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const GT_RASTER_TYPE_GEOKEY: u32 = 1025;
const GEOGRAPHIC_TYPE_GEOKEY: u32 = 2048;
const PROJECTED_CS_TYPE_GEOKEY: u32 = 3072;

/// Geo metadata pulled from the tag directory
#[derive(Debug, Default)]
struct GeoTags {
    transform: Option<GeoTransform>,
    anchor: Option<CellAnchor>,
    epsg: Option<u32>,
    nodata: Option<f64>,
}

/// Read a GeoTIFF file into a raster, all samples deinterleaved into bands
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file)
        .map_err(|e| Error::UnsupportedFormat(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let samples = samples_per_pixel(&mut decoder)?;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("cannot read image data: {}", e)))?;
    let interleaved = cast_decoded::<T>(result)?;

    if interleaved.len() != rows * cols * samples {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let bands = deinterleave(&interleaved, rows, cols, samples)?;
    let mut raster = Raster::from_bands(bands)?;

    let tags = read_geo_tags(&mut decoder);
    let transform = match tags.transform {
        Some(t) => t,
        None => match worldfile::sidecar_for(path) {
            Some(sidecar) => worldfile::read_world_file(&sidecar)?,
            None => {
                return Err(Error::UnsupportedFormat(format!(
                    "{}: no GeoTIFF tags and no world file",
                    path.display()
                )))
            }
        },
    };
    raster.set_transform(transform);

    if let Some(anchor) = tags.anchor {
        raster.set_anchor(anchor);
    }
    if let Some(code) = tags.epsg {
        raster.set_crs(Some(Crs::Epsg(code)));
    }
    if let Some(nd) = tags.nodata {
        raster.set_nodata(T::from_f64(nd));
    }

    Ok(raster)
}

fn samples_per_pixel<R>(decoder: &mut Decoder<R>) -> Result<usize>
where
    R: std::io::Read + std::io::Seek,
{
    use tiff::ColorType;
    match decoder
        .colortype()
        .map_err(|e| Error::Other(format!("cannot read color type: {}", e)))?
    {
        ColorType::Gray(_) => Ok(1),
        ColorType::RGB(_) => Ok(3),
        ColorType::RGBA(_) => Ok(4),
        other => Err(Error::UnsupportedDataType(format!(
            "unsupported TIFF color type: {:?}",
            other
        ))),
    }
}

fn cast_decoded<T: RasterElement>(result: DecodingResult) -> Result<Vec<T>> {
    macro_rules! cast {
        ($buf:expr) => {
            Ok($buf
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or_else(T::cast_fallback))
                .collect())
        };
    }
    match result {
        DecodingResult::U8(buf) => cast!(buf),
        DecodingResult::U16(buf) => cast!(buf),
        DecodingResult::U32(buf) => cast!(buf),
        DecodingResult::U64(buf) => cast!(buf),
        DecodingResult::I8(buf) => cast!(buf),
        DecodingResult::I16(buf) => cast!(buf),
        DecodingResult::I32(buf) => cast!(buf),
        DecodingResult::I64(buf) => cast!(buf),
        DecodingResult::F32(buf) => cast!(buf),
        DecodingResult::F64(buf) => cast!(buf),
    }
}

fn deinterleave<T: RasterElement>(
    data: &[T],
    rows: usize,
    cols: usize,
    samples: usize,
) -> Result<Vec<Band<T>>> {
    (0..samples)
        .map(|s| {
            let band: Vec<T> = data
                .iter()
                .skip(s)
                .step_by(samples)
                .copied()
                .collect();
            Band::from_vec(band, rows, cols)
        })
        .collect()
}

fn read_geo_tags<R>(decoder: &mut Decoder<R>) -> GeoTags
where
    R: std::io::Read + std::io::Seek,
{
    let mut tags = GeoTags::default();

    // ModelTransformationTag takes precedence over tiepoint + scale
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 8 {
            tags.transform = GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]).ok();
        }
    }
    if tags.transform.is_none() {
        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);
        let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
        if let (Ok(scale), Ok(tie)) = (scale, tiepoint) {
            if scale.len() >= 2 && tie.len() >= 6 {
                // tiepoint: [I, J, K, X, Y, Z]; scale: [Sx, Sy, Sz]
                let origin_x = tie[3] - tie[0] * scale[0];
                let origin_y = tie[4] + tie[1] * scale[1];
                tags.transform =
                    GeoTransform::north_up(origin_x, origin_y, scale[0], -scale[1]).ok();
            }
        }
    }

    if let Ok(keys) = decoder.get_tag_u32_vec(Tag::GeoKeyDirectoryTag) {
        // Header [version, revision, minor, count] then 4-value key entries
        for entry in keys.chunks_exact(4).skip(1) {
            let (key_id, location, value) = (entry[0], entry[1], entry[3]);
            if location != 0 {
                continue; // value stored in another tag; not needed here
            }
            match key_id {
                GT_RASTER_TYPE_GEOKEY => {
                    tags.anchor = match value {
                        1 => Some(CellAnchor::Center),
                        2 => Some(CellAnchor::NorthWest),
                        _ => None,
                    };
                }
                GEOGRAPHIC_TYPE_GEOKEY | PROJECTED_CS_TYPE_GEOKEY => {
                    if tags.epsg.is_none() && value != 0 && value != 32767 {
                        tags.epsg = Some(value);
                    }
                }
                _ => {}
            }
        }
    }

    // GDAL stores the nodata sentinel as an ASCII number
    if let Ok(s) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        tags.nodata = s.trim_matches(['\0', ' ', '\n']).parse::<f64>().ok();
    }

    tags
}

/// Geo tags prepared for the encoder, precedence already applied
struct EncodedGeoTags {
    /// `Some` when the grid is rotated and needs the full 4x4 matrix
    transformation: Option<[f64; 16]>,
    scale: [f64; 3],
    tiepoint: [f64; 6],
    geokeys: Vec<u16>,
    nodata: Option<String>,
}

fn prepare_geo_tags<T: RasterElement>(raster: &Raster<T>) -> EncodedGeoTags {
    let gt = raster.transform();

    let transformation = (gt.xskew() != 0.0 || gt.yskew() != 0.0).then(|| {
        [
            gt.xscale(),
            gt.xskew(),
            0.0,
            gt.xoffset(),
            gt.yskew(),
            gt.yscale(),
            0.0,
            gt.yoffset(),
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ]
    });

    let raster_type: u16 = match raster.anchor() {
        CellAnchor::Center => 1,
        CellAnchor::NorthWest => 2,
    };
    let mut geokeys: Vec<u16> = vec![
        1, 1, 0, 2, // version 1.1.0, 2 keys
        1024, 0, 1, 1, // GTModelTypeGeoKey = projected
        1025, 0, 1, raster_type,
    ];
    if let Some(Crs::Epsg(code)) = raster.crs() {
        geokeys[3] += 1;
        geokeys.extend_from_slice(&[3072, 0, 1, *code as u16]);
    }

    EncodedGeoTags {
        transformation,
        scale: [gt.xscale(), gt.yscale().abs(), 0.0],
        tiepoint: [0.0, 0.0, 0.0, gt.xoffset(), gt.yoffset(), 0.0],
        geokeys,
        nodata: raster
            .nodata()
            .and_then(|v| v.to_f64())
            .map(|nd| nd.to_string()),
    }
}

/// Write a raster as a GeoTIFF.
///
/// One band writes 32-bit float grayscale; three and four bands write
/// RGB8/RGBA8. Any other band count is a [`Error::BandCount`]: callers
/// must split and save per band.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(file)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let tags = prepare_geo_tags(raster);

    // The ImageEncoder type is color-type generic, so the per-arm bodies
    // are stamped out by macro instead of routed through one helper.
    macro_rules! encode {
        ($color:ty, $data:expr) => {{
            let mut image = encoder
                .new_image::<$color>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("cannot create TIFF image: {}", e)))?;
            if let Some(m) = &tags.transformation {
                image
                    .encoder()
                    .write_tag(Tag::ModelTransformationTag, &m[..])
                    .map_err(|e| {
                        Error::Other(format!("cannot write transformation tag: {}", e))
                    })?;
            } else {
                image
                    .encoder()
                    .write_tag(Tag::ModelPixelScaleTag, &tags.scale[..])
                    .map_err(|e| Error::Other(format!("cannot write scale tag: {}", e)))?;
                image
                    .encoder()
                    .write_tag(Tag::ModelTiepointTag, &tags.tiepoint[..])
                    .map_err(|e| Error::Other(format!("cannot write tiepoint tag: {}", e)))?;
            }
            image
                .encoder()
                .write_tag(Tag::GeoKeyDirectoryTag, tags.geokeys.as_slice())
                .map_err(|e| Error::Other(format!("cannot write geokey tag: {}", e)))?;
            if let Some(nd) = &tags.nodata {
                image
                    .encoder()
                    .write_tag(Tag::GdalNodata, nd.as_str())
                    .map_err(|e| Error::Other(format!("cannot write nodata tag: {}", e)))?;
            }
            image
                .write_data(&$data)
                .map_err(|e| Error::Other(format!("cannot write image data: {}", e)))?;
        }};
    }

    match raster.band_count() {
        1 => {
            let data: Vec<f32> = raster
                .band(0)?
                .iter()
                .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
                .collect();
            encode!(Gray32Float, data);
        }
        3 => {
            let data = interleave_u8(raster, 3)?;
            encode!(RGB8, data);
        }
        4 => {
            let data = interleave_u8(raster, 4)?;
            encode!(RGBA8, data);
        }
        count => return Err(Error::BandCount { count }),
    }

    Ok(())
}

fn interleave_u8<T: RasterElement>(raster: &Raster<T>, samples: usize) -> Result<Vec<u8>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Bounds;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn sample_raster() -> Raster<f32> {
        let mut raster: Raster<f32> = Raster::new(4, 4);
        for row in 0..4 {
            for col in 0..4 {
                raster.set(0, row, col, (row * 4 + col) as f32).unwrap();
            }
        }
        raster.set_transform(GeoTransform::north_up(0.0, 4.0, 1.0, -1.0).unwrap());
        raster.set_nodata(Some(-1.0));
        raster
    }

    #[test]
    fn test_geotiff_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.tif");

        write_geotiff(&sample_raster(), &path).unwrap();
        let back: Raster<f32> = read_geotiff(&path).unwrap();

        assert_eq!(back.shape(), (4, 4));
        assert_eq!(back.band_count(), 1);
        assert_eq!(back.get(0, 2, 3).unwrap(), 11.0);
        assert_eq!(back.nodata(), Some(-1.0));

        let b = back.bounds();
        assert_relative_eq!(b.xmin, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.ymin, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.xmax, 4.0, epsilon = 1e-9);
        assert_relative_eq!(b.ymax, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scenario_geo_to_cell_inside_extent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.tif");
        write_geotiff(&sample_raster(), &path).unwrap();

        let back: Raster<f32> = read_geotiff(&path).unwrap();
        assert_eq!(
            back.bounds().normalized(),
            Bounds::new(0.0, 0.0, 4.0, 4.0).normalized()
        );

        let (col, row) = back.geo_to_cell(2.0, 2.0);
        assert!((0.0..4.0).contains(&col));
        assert!((0.0..4.0).contains(&row));
    }

    #[test]
    fn test_rotated_transform_roundtrips_via_transformation_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rot.tif");

        let mut raster = sample_raster();
        raster.set_transform(GeoTransform::new(1.0, 0.2, 10.0, 0.1, -1.0, 20.0).unwrap());
        write_geotiff(&raster, &path).unwrap();

        let back: Raster<f32> = read_geotiff(&path).unwrap();
        for (a, b) in raster
            .transform()
            .coefficients()
            .iter()
            .zip(back.transform().coefficients())
        {
            assert_relative_eq!(a, &b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_transformation_tag_wins_over_scale_and_tiepoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("both.tif");

        // Hand-build a file carrying both georeferencing forms with
        // conflicting coefficients
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<Gray32Float>(2, 2).unwrap();
        let matrix = [
            2.0, 0.0, 0.0, 100.0, //
            0.0, -2.0, 0.0, 200.0, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(Tag::ModelTransformationTag, &matrix[..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[5.0, 5.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0, 0.0, 0.0, 900.0, 900.0, 0.0][..],
            )
            .unwrap();
        image.write_data(&[0.0_f32; 4]).unwrap();

        let back: Raster<f32> = read_geotiff(&path).unwrap();
        let gt = back.transform();
        assert_relative_eq!(gt.xscale(), 2.0);
        assert_relative_eq!(gt.yscale(), -2.0);
        assert_relative_eq!(gt.xoffset(), 100.0);
        assert_relative_eq!(gt.yoffset(), 200.0);
    }

    #[test]
    fn test_reject_two_bands_on_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.tif");
        let raster =
            Raster::from_bands(vec![Band::<u8>::new(2, 2), Band::new(2, 2)]).unwrap();

        assert!(matches!(
            write_geotiff(&raster, &path),
            Err(Error::BandCount { count: 2 })
        ));
    }

    #[test]
    fn test_rgb_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgb.tif");

        let mut raster = Raster::from_bands(vec![
            Band::<u8>::filled(2, 2, 10),
            Band::filled(2, 2, 20),
            Band::filled(2, 2, 30),
        ])
        .unwrap();
        raster.set_transform(GeoTransform::north_up(0.0, 2.0, 1.0, -1.0).unwrap());
        write_geotiff(&raster, &path).unwrap();

        let back: Raster<u8> = read_geotiff(&path).unwrap();
        assert_eq!(back.band_count(), 3);
        assert_eq!(back.get(1, 0, 0).unwrap(), 20);
        assert_eq!(back.get(2, 1, 1).unwrap(), 30);
    }

    #[test]
    fn test_crs_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crs.tif");

        let mut raster = sample_raster();
        raster.set_crs(Some(Crs::Epsg(32633)));
        write_geotiff(&raster, &path).unwrap();

        let back: Raster<f32> = read_geotiff(&path).unwrap();
        assert_eq!(back.crs(), Some(&Crs::Epsg(32633)));
    }
}
