use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// Point struct that holds the position
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Point {
    pub position: Point3<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
        }
    }

    /// Parses the leading `x y z` fields of a delimited text record.
    /// Fields may be separated by whitespace or commas; trailing fields are ignored.
    pub fn try_parse(line: &str) -> Result<Self> {
        let mut split = fields(line);
        match (split.next(), split.next(), split.next()) {
            (Some(x), Some(y), Some(z)) => {
                let x = parse_coordinate(x)?;
                let y = parse_coordinate(y)?;
                let z = parse_coordinate(z)?;
                Ok(Point::new(x, y, z))
            }
            _ => Err(FilterError::malformed(format!(
                "expected at least 3 coordinates in {:?}",
                line
            ))),
        }
    }
}

impl From<Point3<f64>> for Point {
    fn from(position: Point3<f64>) -> Self {
        Self { position }
    }
}

/// Splits a text record on whitespace and commas, skipping empty fields.
pub(crate) fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
}

fn parse_coordinate(field: &str) -> Result<f64> {
    let v: f64 = field
        .parse()
        .map_err(|_| FilterError::malformed(format!("invalid coordinate {:?}", field)))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FilterError::malformed(format!(
            "non-finite coordinate {:?}",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::Point;

    #[test]
    fn parse_whitespace_and_comma_records() {
        let p = Point::try_parse("1.5 -2 3e2 255 0 0").unwrap();
        assert_eq!(p, Point::new(1.5, -2., 300.));

        let p = Point::try_parse("1,2, 3,0.5").unwrap();
        assert_eq!(p, Point::new(1., 2., 3.));
    }

    #[test]
    fn reject_incomplete_or_invalid_records() {
        assert!(Point::try_parse("1 2").is_err());
        assert!(Point::try_parse("1 two 3").is_err());
        assert!(Point::try_parse("1 nan 3").is_err());
        assert!(Point::try_parse("").is_err());
    }
}
