use serde::{Deserialize, Serialize};

use super::Fixed;

/// 2D vector of [`Fixed`] components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: Fixed,
    pub y: Fixed,
}

impl FixedVec2 {
    pub const ZERO: Self = Self { x: Fixed::ZERO, y: Fixed::ZERO };

    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    pub const fn from_int(x: i64, y: i64) -> Self {
        Self {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
        }
    }

    pub const fn from_raw(x: i64, y: i64) -> Self {
        Self {
            x: Fixed::from_raw(x),
            y: Fixed::from_raw(y),
        }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: Fixed::from_f32(x),
            y: Fixed::from_f32(y),
        }
    }

    pub fn length(self) -> Fixed {
        let len_sq = self.length_squared();
        if len_sq == Fixed::ZERO {
            return Fixed::ZERO;
        }
        len_sq.sqrt()
    }

    pub fn length_squared(self) -> Fixed {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_to(self, other: Self) -> Fixed {
        (other - self).length()
    }

    pub fn distance_squared_to(self, other: Self) -> Fixed {
        (other - self).length_squared()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            Self::ZERO
        } else {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }

    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Self) -> Fixed {
        self.x * other.y - self.y * other.x
    }

    /// Closest point to `point` on the segment `a..b`.
    pub fn closest_point_to_segment(point: Self, a: Self, b: Self) -> Self {
        let p = point - a;
        let n = b - a;
        let l2 = n.length_squared();
        if l2 == Fixed::ZERO {
            // Both ends are the same point.
            return a;
        }

        let d = n.dot(p) / l2;
        if d <= Fixed::ZERO {
            a
        } else if d >= Fixed::ONE {
            b
        } else {
            a + n * d
        }
    }
}

impl std::ops::Add for FixedVec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for FixedVec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<Fixed> for FixedVec2 {
    type Output = Self;
    fn mul(self, rhs: Fixed) -> Self::Output {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

impl std::ops::Div<Fixed> for FixedVec2 {
    type Output = Self;
    fn div(self, rhs: Fixed) -> Self::Output {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl std::ops::Neg for FixedVec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self { x: -self.x, y: -self.y }
    }
}
