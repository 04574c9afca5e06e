//! Conversion of descriptor positions into page rectangles.


use std::fmt;

use serde_json::Value;
use strict_num::FiniteF32;

use crate::descriptor::Position;


/// One of the four members of a position.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Coordinate {
    X,
    Y,
    Width,
    Height,
}
impl Coordinate {
    pub fn key(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}


#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A coordinate is missing, not a number, or not representable as a finite value.
    InvalidGeometry { coordinate: Coordinate, value: Value },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry { coordinate, value: Value::Null }
                => write!(f, "position member {:?} is missing", coordinate.key()),
            Self::InvalidGeometry { coordinate, value }
                => write!(f, "position member {:?} is not a finite number: {}", coordinate.key(), value),
        }
    }
}
impl std::error::Error for Error {
}


/// A rectangle in the page's native coordinate system (usually origin at the bottom left, y
/// growing upwards), in page units.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Rectangle {
    pub x: FiniteF32,
    pub y: FiniteF32,
    pub width: FiniteF32,
    pub height: FiniteF32,
}
impl Rectangle {
    pub fn left(&self) -> f32 { self.x.get() }
    pub fn bottom(&self) -> f32 { self.y.get() }
    pub fn right(&self) -> f32 { self.x.get() + self.width.get() }
    pub fn top(&self) -> f32 { self.y.get() + self.height.get() }

    /// Whether the rectangle lies completely within the given `[llx, lly, urx, ury]` box.
    pub fn is_within(&self, bounds: [f32; 4]) -> bool {
        self.left() >= bounds[0]
            && self.bottom() >= bounds[1]
            && self.right() <= bounds[2]
            && self.top() <= bounds[3]
    }
}


fn finite_coordinate(coordinate: Coordinate, value: &Value) -> Result<FiniteF32, Error> {
    value.as_f64()
        .and_then(|v| FiniteF32::new(v as f32))
        .ok_or_else(|| Error::InvalidGeometry { coordinate, value: value.clone() })
}


/// Maps a descriptor position onto a rectangle.
///
/// No clamping against the page size takes place; a rectangle may extend past the visible area.
pub fn to_rectangle(position: &Position) -> Result<Rectangle, Error> {
    let rect = Rectangle {
        x: finite_coordinate(Coordinate::X, &position.x)?,
        y: finite_coordinate(Coordinate::Y, &position.y)?,
        width: finite_coordinate(Coordinate::Width, &position.width)?,
        height: finite_coordinate(Coordinate::Height, &position.height)?,
    };

    // the far edges must be finite too
    if !rect.right().is_finite() {
        return Err(Error::InvalidGeometry { coordinate: Coordinate::Width, value: position.width.clone() });
    }
    if !rect.top().is_finite() {
        return Err(Error::InvalidGeometry { coordinate: Coordinate::Height, value: position.height.clone() });
    }
    Ok(rect)
}
