//! Fixed-length ordered set of landmark points ("sights"): parallel arrays
//! of `x`, `y`, and lazily-present `z`/`score`, indexed by landmark number.

use crate::error::{CoreError, Result};

/// A single landmark point within a [`Sights`] set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sight {
    pub x: i64,
    pub y: i64,
    pub z: Option<i64>,
    pub score: Option<f32>,
}

/// A fixed-length (`N`, decided at construction) ordered set of landmark
/// points, e.g. facial landmarks for one detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct Sights {
    points: Vec<Sight>,
}

impl Sights {
    /// Create a set of `n` unset points (all zeroed, no z/score).
    pub fn new(n: usize) -> Self {
        Sights {
            points: vec![Sight::default(); n],
        }
    }

    /// Number of landmark points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.points.len() {
            return Err(CoreError::OutOfRange(format!(
                "sight index {i} out of range for {} points",
                self.points.len()
            )));
        }
        Ok(())
    }

    /// Set the point at index `i`.
    pub fn set_sight(
        &mut self,
        i: usize,
        x: i64,
        y: i64,
        z: Option<i64>,
        score: Option<f32>,
    ) -> Result<()> {
        self.check_index(i)?;
        if let Some(s) = score {
            if !(0.0..=1.0).contains(&s) {
                return Err(CoreError::InvalidArgument(format!(
                    "sight score must be in [0,1], got {s}"
                )));
            }
        }
        self.points[i] = Sight { x, y, z, score };
        Ok(())
    }

    /// Read the point at index `i`.
    pub fn get_sight(&self, i: usize) -> Result<Sight> {
        self.check_index(i)?;
        Ok(self.points[i])
    }

    /// Per-index midpoint with `other`, which must have the same length.
    /// `z` is only produced where both sides have it; `score` is the mean
    /// where both sides have it.
    pub fn intermediate(&self, other: &Sights) -> Result<Sights> {
        if self.len() != other.len() {
            return Err(CoreError::LengthMismatch(format!(
                "sights of length {} and {} cannot be blended",
                self.len(),
                other.len()
            )));
        }

        let mut out = Sights::new(self.len());
        for i in 0..self.len() {
            let a = self.points[i];
            let b = other.points[i];
            let x = a.x + ((b.x - a.x) / 2);
            let y = a.y + ((b.y - a.y) / 2);
            let z = match (a.z, b.z) {
                (Some(az), Some(bz)) => Some(az + ((bz - az) / 2)),
                _ => None,
            };
            let score = match (a.score, b.score) {
                (Some(asc), Some(bsc)) => Some((asc + bsc) / 2.0),
                _ => None,
            };
            out.points[i] = Sight { x, y, z, score };
        }
        Ok(out)
    }

    /// Bounding-box midpoint of all set points.
    pub fn center(&self) -> Result<(i64, i64)> {
        if self.points.is_empty() {
            return Err(CoreError::InvalidArgument(
                "cannot compute the center of an empty sight set".into(),
            ));
        }
        let min_x = self.points.iter().map(|p| p.x).min().unwrap();
        let max_x = self.points.iter().map(|p| p.x).max().unwrap();
        let min_y = self.points.iter().map(|p| p.y).min().unwrap();
        let max_y = self.points.iter().map(|p| p.y).max().unwrap();
        Ok((min_x + (max_x - min_x) / 2, min_y + (max_y - min_y) / 2))
    }

    /// Expand every point away from the point at `center_index` by `factor`
    /// in each dimension that has data. Points coincident with the center
    /// are unchanged.
    pub fn scale(&mut self, center_index: usize, factor: f64) -> Result<()> {
        self.check_index(center_index)?;
        if factor <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "sight scale factor must be positive, got {factor}"
            )));
        }
        let center = self.points[center_index];
        for p in self.points.iter_mut() {
            p.x = center.x + (((p.x - center.x) as f64) * factor) as i64;
            p.y = center.y + (((p.y - center.y) as f64) * factor) as i64;
            if let Some(z) = p.z {
                if let Some(cz) = center.z {
                    p.z = Some(cz + (((z - cz) as f64) * factor) as i64);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut sights = Sights::new(3);
        sights.set_sight(1, 10, 20, Some(5), Some(0.8)).unwrap();
        let p = sights.get_sight(1).unwrap();
        assert_eq!(p.x, 10);
        assert_eq!(p.y, 20);
        assert_eq!(p.z, Some(5));
        assert_eq!(p.score, Some(0.8));
    }

    #[test]
    fn out_of_range_index_errors() {
        let sights = Sights::new(2);
        assert!(sights.get_sight(5).is_err());
    }

    #[test]
    fn intermediate_requires_equal_length() {
        let a = Sights::new(2);
        let b = Sights::new(3);
        assert!(a.intermediate(&b).is_err());
    }

    #[test]
    fn intermediate_is_midpoint_per_index() {
        let mut a = Sights::new(1);
        a.set_sight(0, 0, 0, None, None).unwrap();
        let mut b = Sights::new(1);
        b.set_sight(0, 10, 20, None, None).unwrap();
        let mid = a.intermediate(&b).unwrap();
        let p = mid.get_sight(0).unwrap();
        assert_eq!(p.x, 5);
        assert_eq!(p.y, 10);
    }

    #[test]
    fn scale_leaves_center_point_unchanged() {
        let mut sights = Sights::new(2);
        sights.set_sight(0, 50, 50, None, None).unwrap();
        sights.set_sight(1, 60, 70, None, None).unwrap();
        sights.scale(0, 2.0).unwrap();
        let center = sights.get_sight(0).unwrap();
        assert_eq!(center.x, 50);
        assert_eq!(center.y, 50);
        let moved = sights.get_sight(1).unwrap();
        assert_eq!(moved.x, 70);
        assert_eq!(moved.y, 90);
    }
}
