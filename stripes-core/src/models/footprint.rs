use std::ops::Range;

use crate::errors::{Result, StripeError};
use crate::models::Orientation;

///
/// Half-open span of bins, `[start, end)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinSpan {
    pub start: usize,
    pub end: usize,
}

impl BinSpan {
    pub fn new(start: usize, end: usize) -> Self {
        BinSpan { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bins shared with `other`.
    pub fn intersection_len(&self, other: &BinSpan) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.saturating_sub(start)
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn shifted(&self, offset: usize) -> Self {
        BinSpan::new(self.start + offset, self.end + offset)
    }
}

impl From<Range<usize>> for BinSpan {
    fn from(value: Range<usize>) -> Self {
        BinSpan::new(value.start, value.end)
    }
}

///
/// Axis-aligned rectangle in bin space, upper-triangle frame: `x` is the first
/// column, `y` the first row.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub height: usize,
    pub width: usize,
}

impl BoundingBox {
    pub fn area(&self) -> usize {
        self.height * self.width
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> usize {
        let cols = BinSpan::new(self.x, self.x + self.width)
            .intersection_len(&BinSpan::new(other.x, other.x + other.width));
        let rows = BinSpan::new(self.y, self.y + self.height)
            .intersection_len(&BinSpan::new(other.y, other.y + other.height));
        rows * cols
    }
}

///
/// Placement of a stripe: the anchor is the span across the stripe (its width),
/// the extent the span along it (its length).
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub orientation: Orientation,
    pub anchor: BinSpan,
    pub extent: BinSpan,
}

impl Footprint {
    ///
    /// Create a footprint, checking that it is non-empty and lies entirely on
    /// its own side of the diagonal.
    ///
    pub fn new(orientation: Orientation, anchor: BinSpan, extent: BinSpan) -> Result<Self> {
        if anchor.is_empty() {
            return Err(StripeError::Geometry(format!(
                "empty anchor {:?}",
                anchor.as_range()
            )));
        }
        if extent.is_empty() {
            return Err(StripeError::Geometry(format!(
                "empty extent {:?}",
                extent.as_range()
            )));
        }
        let crosses = match orientation {
            Orientation::Right => extent.end > anchor.start,
            Orientation::Left => extent.start < anchor.end,
        };
        if crosses {
            return Err(StripeError::Geometry(format!(
                "{} stripe with anchor {:?} and extent {:?} crosses the diagonal",
                orientation,
                anchor.as_range(),
                extent.as_range()
            )));
        }

        Ok(Footprint {
            orientation,
            anchor,
            extent,
        })
    }

    pub fn width(&self) -> usize {
        self.anchor.len()
    }

    pub fn length(&self) -> usize {
        self.extent.len()
    }

    /// Row span in the upper triangle.
    pub fn rows(&self) -> BinSpan {
        match self.orientation {
            Orientation::Right => self.extent,
            Orientation::Left => self.anchor,
        }
    }

    /// Column span in the upper triangle.
    pub fn cols(&self) -> BinSpan {
        match self.orientation {
            Orientation::Right => self.anchor,
            Orientation::Left => self.extent,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        let rows = self.rows();
        let cols = self.cols();
        BoundingBox {
            x: cols.start,
            y: rows.start,
            height: rows.len(),
            width: cols.len(),
        }
    }

    ///
    /// Shared bounding-box area divided by the area of the smaller box. Zero for
    /// disjoint footprints, one when one box contains the other.
    ///
    pub fn overlap_fraction(&self, other: &Footprint) -> f64 {
        let a = self.bbox();
        let b = other.bbox();
        let smaller = a.area().min(b.area());
        if smaller == 0 {
            return 0.0;
        }
        a.intersection_area(&b) as f64 / smaller as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn right_stripe() -> Footprint {
        Footprint::new(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(20, 50)).unwrap()
    }

    #[rstest]
    fn test_right_stripe_is_vertical(right_stripe: Footprint) {
        let bbox = right_stripe.bbox();
        assert_eq!(bbox.x, 50);
        assert_eq!(bbox.y, 20);
        assert_eq!(bbox.width, 3);
        assert_eq!(bbox.height, 30);
    }

    #[rstest]
    fn test_left_stripe_is_horizontal() {
        let fp =
            Footprint::new(Orientation::Left, BinSpan::new(10, 12), BinSpan::new(12, 40)).unwrap();
        let bbox = fp.bbox();
        assert_eq!((bbox.x, bbox.y), (12, 10));
        assert_eq!((bbox.height, bbox.width), (2, 28));
        assert_eq!(fp.width(), 2);
        assert_eq!(fp.length(), 28);
    }

    #[rstest]
    #[case(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(20, 52))]
    #[case(Orientation::Left, BinSpan::new(10, 12), BinSpan::new(11, 40))]
    #[case(Orientation::Right, BinSpan::new(50, 50), BinSpan::new(20, 40))]
    #[case(Orientation::Left, BinSpan::new(10, 12), BinSpan::new(30, 30))]
    fn test_invalid_geometry(
        #[case] orientation: Orientation,
        #[case] anchor: BinSpan,
        #[case] extent: BinSpan,
    ) {
        let result = Footprint::new(orientation, anchor, extent);
        assert!(matches!(result, Err(StripeError::Geometry(_))));
    }

    #[rstest]
    fn test_overlap_fraction(right_stripe: Footprint) {
        assert_eq!(right_stripe.overlap_fraction(&right_stripe), 1.0);

        let shorter =
            Footprint::new(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(30, 50)).unwrap();
        assert_eq!(right_stripe.overlap_fraction(&shorter), 1.0);

        let shifted =
            Footprint::new(Orientation::Right, BinSpan::new(51, 54), BinSpan::new(20, 50)).unwrap();
        let expected = 2.0 / 3.0;
        assert!((right_stripe.overlap_fraction(&shifted) - expected).abs() < 1e-12);

        let apart =
            Footprint::new(Orientation::Right, BinSpan::new(70, 73), BinSpan::new(20, 50)).unwrap();
        assert_eq!(right_stripe.overlap_fraction(&apart), 0.0);
    }

    #[rstest]
    fn test_bin_span_shifted(right_stripe: Footprint) {
        assert_eq!(right_stripe.anchor.shifted(100), BinSpan::new(150, 153));
        assert_eq!(right_stripe.extent.shifted(0), right_stripe.extent);
    }
}
