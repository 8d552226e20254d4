use serde::{Deserialize, Serialize};

/// A pointer position in logical pixels, origin top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned bounds of a rendered element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Edges as `(left, right, top, bottom)`; a negative width or height
    /// extends the rectangle the other way from its origin.
    fn edges(&self) -> (f64, f64, f64, f64) {
        let (x2, y2) = (self.x + self.width, self.y + self.height);
        (self.x.min(x2), self.x.max(x2), self.y.min(y2), self.y.max(y2))
    }

    pub fn contains(&self, p: Point) -> bool {
        let (left, right, top, bottom) = self.edges();
        p.x >= left && p.x <= right && p.y >= top && p.y <= bottom
    }

    /// Squared distance from `p` to the closest point of the rectangle (0 inside).
    pub fn distance_sq_to(&self, p: Point) -> f64 {
        let (left, right, top, bottom) = self.edges();
        let dx = (left - p.x).max(p.x - right).max(0.0);
        let dy = (top - p.y).max(p.y - bottom).max(0.0);
        dx * dx + dy * dy
    }
}

/// The direction in which a container lays out its items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Flow {
    /// Items stacked top to bottom.
    #[default]
    Vertical,
    /// Items in a single row, left to right.
    Horizontal,
    /// Items wrap across rows or columns, as in a grid.
    Wrap,
}
