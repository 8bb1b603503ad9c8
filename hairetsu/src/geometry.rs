//! Small vector and rectangle types used for metrics and pixel rects.

/// Two dimensional vector in continuous (fractional pixel or font unit)
/// space.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise multiplication by a scalar.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Two dimensional vector in integer (pixel) space.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(C)]
pub struct Vec2I {
    pub x: i32,
    pub y: i32,
}

impl Vec2I {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in continuous space, stored as (min, max) corner pair.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
#[repr(C)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.min.scaled(factor), self.max.scaled(factor))
    }
}

/// Rectangle in integer pixel space, stored as (min, max) corner pair.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(C)]
pub struct RectI {
    pub min: Vec2I,
    pub max: Vec2I,
}

impl RectI {
    pub const fn new(min: Vec2I, max: Vec2I) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_extents() {
        let rect = Rect::new(Vec2::new(-1.5, -2.0), Vec2::new(2.5, 3.0));
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 5.0);
        let scaled = rect.scaled(2.0);
        assert_eq!(scaled.min, Vec2::new(-3.0, -4.0));
        assert_eq!(scaled.max, Vec2::new(5.0, 6.0));
    }
}
