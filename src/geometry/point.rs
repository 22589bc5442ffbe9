use std::fmt;

use serde::{Deserialize, Serialize};

/// A vertex in image pixel coordinates.
///
/// Serializing a point with a NaN or infinite coordinate fails; JSON has no
/// representation for either.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl Serialize for Point {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{Error, SerializeStruct};
        if !self.is_finite() {
            return Err(S::Error::custom(format!("non-finite point {}", self)));
        }
        let mut state = serializer.serialize_struct("Point", 2)?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.end()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_xy_object() {
        let json = serde_json::to_string(&Point::new(10.0, 20.5)).unwrap();
        assert_eq!(json, r#"{"x":10.0,"y":20.5}"#);
    }

    #[test]
    fn test_non_finite_point_does_not_serialize() {
        let err = serde_json::to_string(&Point::new(f64::NAN, 1.0)).unwrap_err();
        assert!(err.to_string().contains("non-finite point"));
        assert!(serde_json::to_string(&Point::new(1.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::NEG_INFINITY).is_finite());
    }
}
