//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Bounds the numeric types a [`Raster`](crate::raster::Raster) may hold and
/// carries the nodata-sentinel comparison used by mask computation.
///
/// Sentinel matching is exact equality. There is no epsilon tolerance: a
/// float cell is nodata only if it is bit-for-bit equal to the declared
/// sentinel. A NaN sentinel therefore never matches anything.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Minimum value representable by this type
    fn min_value() -> Self;

    /// Maximum value representable by this type
    fn max_value() -> Self;

    /// Fill value used when a cast from another storage type fails
    fn cast_fallback() -> Self;

    /// Check if this value equals the declared nodata sentinel
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        match nodata {
            Some(nd) => *self == nd,
            None => false,
        }
    }

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Number of bytes per cell
    fn byte_width() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert an f64 into this type, if representable
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn min_value() -> Self {
                <$t>::MIN
            }

            fn max_value() -> Self {
                <$t>::MAX
            }

            fn cast_fallback() -> Self {
                <$t>::MIN
            }

            fn is_float() -> bool {
                false
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn min_value() -> Self {
                <$t>::MIN
            }

            fn max_value() -> Self {
                <$t>::MAX
            }

            fn cast_fallback() -> Self {
                <$t>::NAN
            }

            fn is_float() -> bool {
                true
            }
        }
    };
}

impl_raster_element_int!(i8);
impl_raster_element_int!(i16);
impl_raster_element_int!(i32);
impl_raster_element_int!(i64);
impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(u32);
impl_raster_element_int!(u64);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sentinel_match() {
        let v: f64 = -9999.0;
        assert!(v.is_nodata(Some(-9999.0)));
        assert!(!v.is_nodata(Some(-9999.000001)));
        assert!(!v.is_nodata(None));
    }

    #[test]
    fn test_nan_sentinel_never_matches() {
        let v: f32 = f32::NAN;
        assert!(!v.is_nodata(Some(f32::NAN)));
    }

    #[test]
    fn test_float_detection() {
        assert!(f32::is_float());
        assert!(!u8::is_float());
        assert_eq!(u8::byte_width(), 1);
    }
}
