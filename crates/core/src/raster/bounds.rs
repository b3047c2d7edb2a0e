//! Geographic bounding boxes

use serde::{Deserialize, Serialize};

/// An axis-aligned geographic bounding box.
///
/// Not guaranteed to be in min/max order on construction; call
/// [`normalized`](Bounds::normalized) before arithmetic that assumes it.
/// Rasters with inverted axes legitimately produce swapped corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Reorder the corners so min <= max on both axes
    pub fn normalized(&self) -> Self {
        Self {
            xmin: self.xmin.min(self.xmax),
            ymin: self.ymin.min(self.ymax),
            xmax: self.xmin.max(self.xmax),
            ymax: self.ymin.max(self.ymax),
        }
    }

    /// Extent along x (nonnegative after normalization)
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Extent along y (nonnegative after normalization)
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Whether the normalized box encloses a nonzero area
    pub fn has_area(&self) -> bool {
        let n = self.normalized();
        n.width() > 0.0 && n.height() > 0.0
    }

    /// Smallest box containing both inputs (both normalized first)
    pub fn union(&self, other: &Bounds) -> Bounds {
        let a = self.normalized();
        let b = other.normalized();
        Bounds {
            xmin: a.xmin.min(b.xmin),
            ymin: a.ymin.min(b.ymin),
            xmax: a.xmax.max(b.xmax),
            ymax: a.ymax.max(b.ymax),
        }
    }

    /// Overlap of both inputs, or `None` when disjoint
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let a = self.normalized();
        let b = other.normalized();
        let xmin = a.xmin.max(b.xmin);
        let ymin = a.ymin.max(b.ymin);
        let xmax = a.xmax.min(b.xmax);
        let ymax = a.ymax.min(b.ymax);
        if xmin < xmax && ymin < ymax {
            Some(Bounds {
                xmin,
                ymin,
                xmax,
                ymax,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_swapped_corners() {
        let b = Bounds::new(10.0, 8.0, 2.0, -3.0).normalized();
        assert_eq!(b, Bounds::new(2.0, -3.0, 10.0, 8.0));
        assert_eq!(b.width(), 8.0);
        assert_eq!(b.height(), 11.0);
    }

    #[test]
    fn test_union() {
        let a = Bounds::new(0.0, 0.0, 4.0, 4.0);
        let b = Bounds::new(2.0, -1.0, 6.0, 3.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, -1.0, 6.0, 4.0));
    }

    #[test]
    fn test_intersection_disjoint() {
        let a = Bounds::new(0.0, 0.0, 1.0, 1.0);
        let b = Bounds::new(2.0, 2.0, 3.0, 3.0);
        assert!(a.intersection(&b).is_none());
        assert!(a.intersection(&a).is_some());
    }

    #[test]
    fn test_zero_area() {
        assert!(!Bounds::new(1.0, 0.0, 1.0, 5.0).has_area());
        assert!(Bounds::new(5.0, 5.0, 0.0, 0.0).has_area());
    }
}
