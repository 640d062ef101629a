//! Points, sizes and bounds used by layout and export.

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Treats the point as the center of a box of `size`.
    pub fn to_bounds(self, size: Size) -> Bounds {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;

        Bounds {
            min_x: self.x - half_width,
            min_y: self.y - half_height,
            max_x: self.x + half_width,
            max_y: self.y + half_height,
        }
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Grows both dimensions by `padding` on every side.
    pub fn add_padding(self, padding: f32) -> Self {
        Self {
            width: padding.mul_add(2.0, self.width),
            height: padding.mul_add(2.0, self.height),
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Merges two bounds to create a larger bounds that contains both
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Point where the segment from the center towards `toward` leaves
    /// the box.
    pub fn boundary_point(self, toward: Point) -> Point {
        let center = Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        );
        let delta = toward.sub_point(center);
        if delta.x == 0.0 && delta.y == 0.0 {
            return center;
        }

        let half_width = self.width() / 2.0;
        let half_height = self.height() / 2.0;
        let scale_x = if delta.x == 0.0 {
            f32::INFINITY
        } else {
            half_width / delta.x.abs()
        };
        let scale_y = if delta.y == 0.0 {
            f32::INFINITY
        } else {
            half_height / delta.y.abs()
        };
        let scale = scale_x.min(scale_y).min(1.0);

        Point::new(delta.x * scale, delta.y * scale).add_point(center)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_to_bounds() {
        let bounds = Point::new(10.0, 20.0).to_bounds(Size::new(4.0, 6.0));

        assert_approx_eq!(f32, bounds.min_x(), 8.0);
        assert_approx_eq!(f32, bounds.min_y(), 17.0);
        assert_approx_eq!(f32, bounds.width(), 4.0);
        assert_approx_eq!(f32, bounds.height(), 6.0);
    }

    #[test]
    fn test_bounds_merge() {
        let a = Point::new(0.0, 0.0).to_bounds(Size::new(2.0, 2.0));
        let b = Point::new(10.0, 5.0).to_bounds(Size::new(2.0, 2.0));
        let merged = a.merge(&b);

        assert_approx_eq!(f32, merged.min_x(), -1.0);
        assert_approx_eq!(f32, merged.max_x(), 11.0);
        assert_approx_eq!(f32, merged.max_y(), 6.0);
    }

    #[test]
    fn test_boundary_point_vertical() {
        let bounds = Point::new(0.0, 0.0).to_bounds(Size::new(10.0, 4.0));
        let point = bounds.boundary_point(Point::new(0.0, 100.0));

        assert_approx_eq!(f32, point.x(), 0.0);
        assert_approx_eq!(f32, point.y(), 2.0);
    }

    #[test]
    fn test_boundary_point_diagonal_hits_side() {
        let bounds = Point::new(0.0, 0.0).to_bounds(Size::new(10.0, 4.0));
        let point = bounds.boundary_point(Point::new(100.0, 10.0));

        assert_approx_eq!(f32, point.x(), 5.0);
        assert_approx_eq!(f32, point.y(), 0.5);
    }

    #[test]
    fn test_size_padding() {
        let size = Size::new(10.0, 5.0).add_padding(2.0);

        assert_approx_eq!(f32, size.width(), 14.0);
        assert_approx_eq!(f32, size.height(), 9.0);
    }
}
