//! Labeled 2D points.
//!
//! The trainer only ever reads points, so any `&[DataPoint]` works as a dataset.
//! `Dataset` is a validated owner for callers that want the label and
//! finiteness checks done once, up front.

use std::ops::Deref;

use crate::{Error, OUTPUT_DIM, Result};

/// A single labeled sample in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPoint {
    pub x: f32,
    pub y: f32,
    /// Class index, `0` or `1`.
    pub label: u8,
}

impl DataPoint {
    /// Build a point, rejecting non-finite coordinates and labels outside `{0, 1}`.
    pub fn new(x: f32, y: f32, label: u8) -> Result<Self> {
        let point = Self { x, y, label };
        point.validate()?;
        Ok(point)
    }

    /// Check coordinates and label.
    pub fn validate(&self) -> Result<()> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(Error::InvalidData(format!(
                "point coordinates must be finite, got ({}, {})",
                self.x, self.y
            )));
        }
        if usize::from(self.label) >= OUTPUT_DIM {
            return Err(Error::InvalidData(format!(
                "label must be < {OUTPUT_DIM}, got {}",
                self.label
            )));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn class(&self) -> usize {
        usize::from(self.label)
    }
}

/// An ordered, validated collection of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    points: Vec<DataPoint>,
}

impl Dataset {
    /// Take ownership of `points`, validating each one.
    pub fn from_points(points: Vec<DataPoint>) -> Result<Self> {
        for (i, p) in points.iter().enumerate() {
            p.validate()
                .map_err(|e| Error::InvalidData(format!("point {i}: {e}")))?;
        }
        Ok(Self { points })
    }

    /// Build from parallel coordinate/label rows.
    ///
    /// This is a convenience constructor (it copies into a new buffer).
    pub fn from_rows(coords: &[[f32; 2]], labels: &[u8]) -> Result<Self> {
        if coords.len() != labels.len() {
            return Err(Error::InvalidData(format!(
                "coords/labels length mismatch: {} vs {}",
                coords.len(),
                labels.len()
            )));
        }

        let mut points = Vec::with_capacity(coords.len());
        for (&[x, y], &label) in coords.iter().zip(labels) {
            points.push(DataPoint { x, y, label });
        }
        Self::from_points(points)
    }

    #[inline]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }

    /// Number of points carrying each label.
    pub fn class_counts(&self) -> [usize; OUTPUT_DIM] {
        let mut counts = [0; OUTPUT_DIM];
        for p in &self.points {
            counts[p.class()] += 1;
        }
        counts
    }
}

impl Deref for Dataset {
    type Target = [DataPoint];

    fn deref(&self) -> &[DataPoint] {
        &self.points
    }
}

impl AsRef<[DataPoint]> for Dataset {
    fn as_ref(&self) -> &[DataPoint] {
        &self.points
    }
}
