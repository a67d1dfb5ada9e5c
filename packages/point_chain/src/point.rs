/// A point in fixed-precision integer coordinates.
///
/// The buffer does not interpret the coordinates - callers are free to treat
/// them as plain integers or as fixed-point values (e.g. 24.8). The type is a
/// plain value: copying it is always cheap and never observable.
///
/// # Example
///
/// ```rust
/// use point_chain::Point;
///
/// let p = Point::new(256, -256);
/// assert_eq!(p.x, 256);
/// assert_eq!(p.y, -256);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,

    /// Vertical coordinate.
    pub y: i32,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Point: Copy, Debug, Eq, Send, Sync);

    #[test]
    fn construction_preserves_coordinates() {
        let p = Point::new(i32::MIN, i32::MAX);

        assert_eq!(p.x, i32::MIN);
        assert_eq!(p.y, i32::MAX);
    }
}
