//! Axis-aligned rectangle with an optional detection confidence.
//!
//! A `Coord` represents the bounding box of a detected face (or any other
//! rectangular region of interest) inside a video frame: `(x, y, w, h)` plus
//! an optional confidence score in `[0, 1]`. It carries no identity of its
//! own — identity assignment is the orchestrator's job.

use crate::error::{CoreError, Result};

/// Maximum coordinate/size value accepted for any axis, matching the
/// largest frame dimension this pipeline is expected to ever see.
pub const MAX_COORD: i64 = 30_720;

/// An axis-aligned rectangle with an optional confidence score.
///
/// By default coordinates are unsigned (`x, y >= 0`); construct with
/// [`Coord::new_signed`] to allow negative positions (used internally by
/// some smoothing predictions before they are clamped).
#[derive(Debug, Clone, Copy)]
pub struct Coord {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
    confidence: Option<f32>,
    unsigned: bool,
}

/// Equality ignores confidence and the signed/unsigned flag: two rectangles
/// at the same position and size are the same rectangle.
impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.w == other.w && self.h == other.h
    }
}

impl Coord {
    /// Create a new unsigned coordinate with no confidence score.
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Result<Self> {
        Self::with_confidence(x, y, w, h, None, true)
    }

    /// Create a new unsigned coordinate with a confidence score.
    pub fn with_score(x: i64, y: i64, w: i64, h: i64, confidence: f32) -> Result<Self> {
        Self::with_confidence(x, y, w, h, Some(confidence), true)
    }

    /// Create a coordinate that allows negative `x`/`y`.
    pub fn new_signed(x: i64, y: i64, w: i64, h: i64, confidence: Option<f32>) -> Result<Self> {
        Self::with_confidence(x, y, w, h, confidence, false)
    }

    fn with_confidence(
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        confidence: Option<f32>,
        unsigned: bool,
    ) -> Result<Self> {
        let mut c = Coord {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            confidence: None,
            unsigned,
        };
        c.set_x(x)?;
        c.set_y(y)?;
        c.set_w(w)?;
        c.set_h(h)?;
        c.set_confidence(confidence)?;
        Ok(c)
    }

    /// Coerce a slice of 2, 3, 4 or 5+ numbers into a `Coord`:
    /// `(x,y)` / `(x,y,score)` / `(x,y,w,h)` / `(x,y,w,h,score)`.
    pub fn from_seq(values: &[f64]) -> Result<Self> {
        match values.len() {
            2 => Coord::new(values[0] as i64, values[1] as i64, 0, 0),
            3 => Coord::with_score(values[0] as i64, values[1] as i64, 0, 0, values[2] as f32),
            4 => Coord::new(
                values[0] as i64,
                values[1] as i64,
                values[2] as i64,
                values[3] as i64,
            ),
            n if n >= 5 => Coord::with_score(
                values[0] as i64,
                values[1] as i64,
                values[2] as i64,
                values[3] as i64,
                values[4] as f32,
            ),
            _ => Err(CoreError::InvalidArgument(format!(
                "cannot build a Coord from {} values",
                values.len()
            ))),
        }
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }

    pub fn w(&self) -> i64 {
        self.w
    }

    pub fn h(&self) -> i64 {
        self.h
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    /// Confidence score, or `0.0` if none was set.
    pub fn confidence(&self) -> f32 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn set_x(&mut self, value: i64) -> Result<()> {
        if self.unsigned && value < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "unsigned coord cannot have negative x: {value}"
            )));
        }
        if value.abs() > MAX_COORD {
            return Err(CoreError::OutOfRange(format!(
                "x={value} exceeds max coordinate {MAX_COORD}"
            )));
        }
        self.x = value;
        Ok(())
    }

    pub fn set_y(&mut self, value: i64) -> Result<()> {
        if self.unsigned && value < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "unsigned coord cannot have negative y: {value}"
            )));
        }
        if value.abs() > MAX_COORD {
            return Err(CoreError::OutOfRange(format!(
                "y={value} exceeds max coordinate {MAX_COORD}"
            )));
        }
        self.y = value;
        Ok(())
    }

    pub fn set_w(&mut self, value: i64) -> Result<()> {
        if value < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "width cannot be negative: {value}"
            )));
        }
        if value > MAX_COORD {
            return Err(CoreError::OutOfRange(format!(
                "w={value} exceeds max coordinate {MAX_COORD}"
            )));
        }
        self.w = value;
        Ok(())
    }

    pub fn set_h(&mut self, value: i64) -> Result<()> {
        if value < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "height cannot be negative: {value}"
            )));
        }
        if value > MAX_COORD {
            return Err(CoreError::OutOfRange(format!(
                "h={value} exceeds max coordinate {MAX_COORD}"
            )));
        }
        self.h = value;
        Ok(())
    }

    pub fn set_confidence(&mut self, value: Option<f32>) -> Result<()> {
        if let Some(v) = value {
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::InvalidArgument(format!(
                    "confidence must be in [0,1], got {v}"
                )));
            }
        }
        self.confidence = value;
        Ok(())
    }

    /// Rectangle area (`w * h`).
    pub fn area(&self) -> i64 {
        self.w * self.h
    }

    /// Deep copy, preserving confidence.
    pub fn copy(&self) -> Self {
        *self
    }

    /// Multiply width and height by `coeff` (must be in `[0.25, 20]`),
    /// keeping the rectangle centered. Returns the `(shift_x, shift_y)`
    /// that was applied to keep the center fixed.
    ///
    /// If `image_size` (width, height) is given and the scaled rectangle
    /// would not fit inside it, this fails rather than clamp.
    pub fn scale(&mut self, coeff: f64, image_size: Option<(u32, u32)>) -> Result<(i64, i64)> {
        if !(0.25..=20.0).contains(&coeff) {
            return Err(CoreError::InvalidArgument(format!(
                "scale factor must be in [0.25, 20], got {coeff}"
            )));
        }
        let new_w = (self.w as f64 * coeff) as i64;
        let new_h = (self.h as f64 * coeff) as i64;

        if let Some((width, height)) = image_size {
            if new_w > width as i64 {
                return Err(CoreError::OutOfRange(format!(
                    "scaled width {new_w} exceeds image width {width}"
                )));
            }
            if new_h > height as i64 {
                return Err(CoreError::OutOfRange(format!(
                    "scaled height {new_h} exceeds image height {height}"
                )));
            }
        }

        let shift_x = (self.w - new_w) / 2;
        let shift_y = (self.h - new_h) / 2;
        self.w = new_w;
        self.h = new_h;
        Ok((shift_x, shift_y))
    }

    /// Multiply width only by `coeff`, returning the x shift to recenter.
    pub fn scale_x(&mut self, coeff: f64, image_size: Option<(u32, u32)>) -> Result<i64> {
        if coeff <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "invalid x-scale value {coeff}"
            )));
        }
        let new_w = (self.w as f64 * coeff) as i64;
        if let Some((width, _)) = image_size {
            if new_w > width as i64 {
                return Err(CoreError::OutOfRange(format!(
                    "scaled width {new_w} exceeds image width {width}"
                )));
            }
        }
        let shift_x = (self.w - new_w) / 2;
        self.w = new_w;
        Ok(shift_x)
    }

    /// Multiply height only by `coeff`, returning the y shift to recenter.
    pub fn scale_y(&mut self, coeff: f64, image_size: Option<(u32, u32)>) -> Result<i64> {
        if coeff <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "invalid y-scale value {coeff}"
            )));
        }
        let new_h = (self.h as f64 * coeff) as i64;
        if let Some((_, height)) = image_size {
            if new_h > height as i64 {
                return Err(CoreError::OutOfRange(format!(
                    "scaled height {new_h} exceeds image height {height}"
                )));
            }
        }
        let shift_y = (self.h - new_h) / 2;
        self.h = new_h;
        Ok(shift_y)
    }

    /// Shift position by `(dx, dy)`. Unsigned rectangles clamp below at 0.
    /// If `image_size` is given, a shift that would push the rectangle past
    /// the right/bottom edge is reduced so it touches the edge instead;
    /// shifting entirely past the image on the positive side fails.
    pub fn shift(&mut self, dx: i64, dy: i64, image_size: Option<(u32, u32)>) -> Result<()> {
        let mut new_x = self.x + dx;
        if new_x < 0 && self.unsigned {
            new_x = 0;
        }
        let mut new_y = self.y + dy;
        if new_y < 0 && self.unsigned {
            new_y = 0;
        }

        if let Some((width, height)) = image_size {
            let max_w = width as i64;
            let max_h = height as i64;
            if dx > 0 {
                if new_x > max_w {
                    return Err(CoreError::OutOfRange(format!(
                        "shifted x {new_x} exceeds image width {max_w}"
                    )));
                } else if new_x + self.w > max_w {
                    new_x -= (new_x + self.w) - max_w;
                }
            }
            if dy > 0 {
                if new_y > max_h {
                    return Err(CoreError::OutOfRange(format!(
                        "shifted y {new_y} exceeds image height {max_h}"
                    )));
                } else if new_y + self.h > max_h {
                    new_y -= (new_y + self.h) - max_h;
                }
            }
        }

        self.x = new_x;
        self.y = new_y;
        Ok(())
    }

    /// Area of the intersection of `self` and `other`.
    pub fn intersection_area(&self, other: &Coord) -> i64 {
        let self_xmax = self.x + self.w;
        let other_xmax = other.x + other.w;
        let dx = self_xmax.min(other_xmax) - self.x.max(other.x);

        let self_ymax = self.y + self.h;
        let other_ymax = other.y + other.h;
        let dy = self_ymax.min(other_ymax) - self.y.max(other.y);

        if dx >= 0 && dy >= 0 {
            dx * dy
        } else {
            0
        }
    }

    /// `(pct_of_other, pct_of_self)`: the intersection area as a percentage
    /// of `other`'s area, and as a percentage of `self`'s area.
    pub fn overlap(&self, other: &Coord) -> (f64, f64) {
        let inter = self.intersection_area(other);
        if inter == 0 {
            return (0.0, 0.0);
        }
        let my_area = self.area() as f64;
        let other_area = other.area() as f64;
        (
            (inter as f64 / other_area) * 100.0,
            (inter as f64 / my_area) * 100.0,
        )
    }

    /// Component-wise midpoint rectangle, with averaged confidence.
    pub fn intermediate(&self, other: &Coord) -> Result<Coord> {
        let x = self.x + (other.x - self.x).div_euclid(2);
        let y = self.y + (other.y - self.y).div_euclid(2);
        let w = (self.w + other.w).div_euclid(2);
        let h = (self.h + other.h).div_euclid(2);
        let c = (self.confidence() + other.confidence()) / 2.0;
        Coord::with_score(x, y, w, h, c)
    }

    /// Integer euclidean distance between the two rectangles' top-left
    /// points.
    pub fn euclidian_distance(&self, other: &Coord) -> i64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt().round() as i64
    }

    /// `true` if `other` lies entirely within `self` (strict containment).
    pub fn contains(&self, other: &Coord) -> bool {
        if other.w > self.w || other.h > self.h {
            return false;
        }
        if other.x < self.x || other.y < self.y {
            return false;
        }
        if other.x + other.w > self.x + self.w {
            return false;
        }
        if other.y + other.h > self.y + self.h {
            return false;
        }
        true
    }

    /// Return a portrait-scaled copy of this coordinate: enlarged by
    /// `scale = (sx, sy)` about its center, reshaped to `xy_ratio`, then
    /// shifted up by half the y-growth so the face sits in the upper third.
    /// If `image_size` is given, the result is clamped to fit inside it.
    pub fn portrait(
        &self,
        scale: (f64, f64),
        xy_ratio: f64,
        image_size: Option<(u32, u32)>,
    ) -> Result<Coord> {
        let mut coord = self.copy();
        let mut shift_x = coord.scale_x(scale.0, None)?;
        let mut shift_y = coord.scale_y(scale.1, None)?;

        if xy_ratio > 0.0 && coord.w * coord.h > 0 {
            let current_ratio = coord.w as f64 / coord.h as f64;
            if current_ratio > xy_ratio {
                shift_y += coord.scale_y(current_ratio / xy_ratio, None)?;
            } else if current_ratio < xy_ratio {
                shift_x += coord.scale_x(xy_ratio / current_ratio, None)?;
            }
        }

        // the face sits in the upper third, not dead center
        let shift_y = (shift_y as f64 * 0.5) as i64;

        match image_size {
            None => {
                coord.x += shift_x;
                if coord.unsigned && coord.x < 0 {
                    coord.x = 0;
                }
                coord.y += shift_y;
                if coord.unsigned && coord.y < 0 {
                    coord.y = 0;
                }
            }
            Some((width, height)) => {
                let shifted_x = coord.shift(shift_x, 0, Some((width, height))).is_ok();
                let shifted_y = coord.shift(0, shift_y, Some((width, height))).is_ok();

                if coord.x + coord.w > width as i64 || !shifted_x {
                    coord.x = 0.max(width as i64 - coord.w);
                }
                if coord.y + coord.h > height as i64 || !shifted_y {
                    coord.y = 0.max(height as i64 - coord.h);
                }
            }
        }

        Ok(coord)
    }

    /// Selfie-style portrait scaling: a wider crop than the default
    /// portrait, used for per-identity "selfie" exports.
    pub fn selfie(&self, image_size: Option<(u32, u32)>) -> Result<Coord> {
        self.portrait((4.6, 5.0), 0.875, image_size)
    }

    /// Default portrait scaling, used for per-identity "portrait" exports.
    pub fn default_portrait(&self, image_size: Option<(u32, u32)>) -> Result<Coord> {
        self.portrait((2.6, 3.0), 0.875, image_size)
    }
}

impl Eq for Coord {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_confidence() {
        let a = Coord::with_score(1, 2, 3, 4, 0.1).unwrap();
        let b = Coord::with_score(1, 2, 3, 4, 0.9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn area_zero_yields_zero_overlap() {
        let a = Coord::new(0, 0, 0, 0).unwrap();
        let b = Coord::new(0, 0, 10, 10).unwrap();
        assert_eq!(a.overlap(&b), (0.0, 0.0));
    }

    #[test]
    fn scale_keeps_center_without_image_bound() {
        let mut c = Coord::new(100, 100, 80, 80).unwrap();
        let center_before = (c.x() + c.w() / 2, c.y() + c.h() / 2);
        let (sx, sy) = c.scale(2.0, None).unwrap();
        c.shift(sx, sy, None).unwrap();
        let center_after = (c.x() + c.w() / 2, c.y() + c.h() / 2);
        assert!((center_before.0 - center_after.0).abs() <= 1);
        assert!((center_before.1 - center_after.1).abs() <= 1);
    }

    #[test]
    fn scale_rejects_out_of_range_factor() {
        let mut c = Coord::new(0, 0, 10, 10).unwrap();
        assert!(c.scale(0.1, None).is_err());
        assert!(c.scale(21.0, None).is_err());
    }

    #[test]
    fn scale_rejects_when_exceeding_image_bound() {
        let mut c = Coord::new(0, 0, 100, 100).unwrap();
        assert!(c.scale(2.0, Some((150, 150))).is_err());
    }

    #[test]
    fn intersection_area_is_symmetric() {
        let a = Coord::new(0, 0, 10, 10).unwrap();
        let b = Coord::new(5, 5, 10, 10).unwrap();
        assert_eq!(a.intersection_area(&b), b.intersection_area(&a));
        assert_eq!(a.intersection_area(&b), 25);
    }

    #[test]
    fn intermediate_is_the_midpoint() {
        let a = Coord::with_score(0, 0, 10, 10, 0.2).unwrap();
        let b = Coord::with_score(10, 10, 20, 20, 0.8).unwrap();
        let mid = a.intermediate(&b).unwrap();
        assert_eq!(mid.x(), 5);
        assert_eq!(mid.y(), 5);
        assert_eq!(mid.w(), 15);
        assert_eq!(mid.h(), 15);
        assert!((mid.confidence() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn contains_is_strict() {
        let outer = Coord::new(0, 0, 100, 100).unwrap();
        let inner = Coord::new(10, 10, 50, 50).unwrap();
        let overflowing = Coord::new(10, 10, 200, 200).unwrap();
        assert!(outer.contains(&inner));
        assert!(!outer.contains(&overflowing));
    }

    #[test]
    fn from_seq_dispatches_on_length() {
        assert_eq!(Coord::from_seq(&[1.0, 2.0]).unwrap(), Coord::new(1, 2, 0, 0).unwrap());
        assert_eq!(
            Coord::from_seq(&[1.0, 2.0, 3.0, 4.0]).unwrap(),
            Coord::new(1, 2, 3, 4).unwrap()
        );
    }

    #[test]
    fn euclidian_distance_matches_pythagoras() {
        let a = Coord::new(0, 0, 1, 1).unwrap();
        let b = Coord::new(3, 4, 1, 1).unwrap();
        assert_eq!(a.euclidian_distance(&b), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_coord() -> impl Strategy<Value = Coord> {
        (0i64..10_000, 0i64..10_000, 1i64..2_000, 1i64..2_000)
            .prop_map(|(x, y, w, h)| Coord::new(x, y, w, h).unwrap())
    }

    proptest! {
        /// Scaling without an image bound leaves the rectangle's center
        /// fixed, up to integer rounding by at most 1 pixel per axis.
        #[test]
        fn prop_scale_keeps_center(
            mut c in arb_coord(),
            factor in 0.25f64..20.0,
        ) {
            let center_before = (c.x() + c.w() / 2, c.y() + c.h() / 2);
            let (sx, sy) = c.scale(factor, None).unwrap();
            c.shift(sx, sy, None).unwrap();
            let center_after = (c.x() + c.w() / 2, c.y() + c.h() / 2);
            prop_assert!((center_before.0 - center_after.0).abs() <= 1);
            prop_assert!((center_before.1 - center_after.1).abs() <= 1);
        }

        /// A rectangle with zero area never overlaps anything.
        #[test]
        fn prop_zero_area_overlap_is_zero(other in arb_coord()) {
            let zero = Coord::new(5, 5, 0, 0).unwrap();
            prop_assert_eq!(zero.overlap(&other), (0.0, 0.0));
        }

        /// The intermediate rectangle's top-left point lies between the two
        /// inputs' top-left points on each axis.
        #[test]
        fn prop_intermediate_lies_on_segment(a in arb_coord(), b in arb_coord()) {
            let mid = a.intermediate(&b).unwrap();
            let (lo_x, hi_x) = (a.x().min(b.x()), a.x().max(b.x()));
            let (lo_y, hi_y) = (a.y().min(b.y()), a.y().max(b.y()));
            prop_assert!(mid.x() >= lo_x && mid.x() <= hi_x);
            prop_assert!(mid.y() >= lo_y && mid.y() <= hi_y);
        }

        /// The (x,y,w,h) tuple round-trips exactly through construction.
        #[test]
        fn prop_tuple_round_trip(c in arb_coord()) {
            let rebuilt = Coord::new(c.x(), c.y(), c.w(), c.h()).unwrap();
            prop_assert_eq!(c, rebuilt);
        }
    }
}
