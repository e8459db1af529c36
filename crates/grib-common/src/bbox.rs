//! Bounding box types and coordinate parsing.

use serde::{Deserialize, Serialize};

use crate::error::{GribError, GribResult};

/// A geographic bounding box in degrees.
///
/// All four edges are always present; partial caller input lives in
/// [`Coordinates`] until it is complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub long_min: f64,
    pub long_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box, in the classic `(x, X, y, Y)` order.
    pub fn new(long_min: f64, long_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            long_min,
            long_max,
            lat_min,
            lat_max,
        }
    }

    /// True if either axis has its minimum above its maximum.
    pub fn is_inverted(&self) -> bool {
        self.long_min > self.long_max || self.lat_min > self.lat_max
    }
}

/// Possibly-partial coordinates supplied by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinates {
    pub long_min: Option<f64>,
    pub long_max: Option<f64>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
}

impl Coordinates {
    /// Parse a CLI coordinate string: "x,X,y,Y" (long_min,long_max,lat_min,lat_max).
    pub fn from_cli_string(s: &str) -> Result<Self, CoordinatesParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(CoordinatesParseError::InvalidFormat(s.to_string()));
        }

        // NaN and infinities parse as f64 but cannot go into a URL.
        let parse = |part: &str| -> Result<f64, CoordinatesParseError> {
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CoordinatesParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            long_min: Some(parse(parts[0])?),
            long_max: Some(parse(parts[1])?),
            lat_min: Some(parse(parts[2])?),
            lat_max: Some(parse(parts[3])?),
        })
    }

    /// Names of the fields that are not set.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.long_min.is_none() {
            missing.push("long_min");
        }
        if self.long_max.is_none() {
            missing.push("long_max");
        }
        if self.lat_min.is_none() {
            missing.push("lat_min");
        }
        if self.lat_max.is_none() {
            missing.push("lat_max");
        }
        missing
    }

    /// Convert into a bounding box.
    ///
    /// Returns `Ok(None)` when no field is set and `IncompleteCoordinates`
    /// when only some of them are.
    pub fn to_bbox(&self) -> GribResult<Option<BoundingBox>> {
        match (self.long_min, self.long_max, self.lat_min, self.lat_max) {
            (Some(long_min), Some(long_max), Some(lat_min), Some(lat_max)) => Ok(Some(
                BoundingBox::new(long_min, long_max, lat_min, lat_max),
            )),
            (None, None, None, None) => Ok(None),
            _ => Err(GribError::IncompleteCoordinates {
                missing: self.missing_fields(),
            }),
        }
    }
}

impl From<BoundingBox> for Coordinates {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            long_min: Some(bbox.long_min),
            long_max: Some(bbox.long_max),
            lat_min: Some(bbox.lat_min),
            lat_max: Some(bbox.lat_max),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatesParseError {
    #[error("Invalid coordinates format: {0}. Expected 'long_min,long_max,lat_min,lat_max'")]
    InvalidFormat(String),

    #[error("Invalid number in coordinates: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_coordinates() {
        let coords = Coordinates::from_cli_string("1,13,38,45").unwrap();
        let bbox = coords.to_bbox().unwrap().unwrap();
        assert_eq!(bbox, BoundingBox::new(1.0, 13.0, 38.0, 45.0));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        for input in ["NaN,13,45,38", "1,inf,45,38", "1,13,-infinity,38"] {
            assert!(matches!(
                Coordinates::from_cli_string(input),
                Err(CoordinatesParseError::InvalidNumber(_))
            ));
        }
        assert!(matches!(
            Coordinates::from_cli_string("1,13,45,nan"),
            Err(CoordinatesParseError::InvalidNumber(part)) if part == "nan"
        ));
    }

    #[test]
    fn test_partial_coordinates_rejected() {
        let coords = Coordinates {
            long_min: Some(1.0),
            lat_max: Some(45.0),
            ..Default::default()
        };

        match coords.to_bbox() {
            Err(GribError::IncompleteCoordinates { missing }) => {
                assert_eq!(missing, vec!["long_max", "lat_min"]);
            }
            other => panic!("expected IncompleteCoordinates, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_coordinates_are_none() {
        assert_eq!(Coordinates::default().to_bbox().unwrap(), None);
    }

    #[test]
    fn test_inverted() {
        assert!(BoundingBox::new(1.0, 13.0, 45.0, 38.0).is_inverted());
        assert!(!BoundingBox::new(1.0, 13.0, 38.0, 45.0).is_inverted());
    }
}
