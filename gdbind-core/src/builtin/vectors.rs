/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use gdbind_ffi as sys;
use glam::{Vec2, Vec3};

use crate::builtin::macros::impl_builtin_pod;

/// Vector used for 2D math using floating point coordinates.
///
/// Components are 32-bit floats, matching the engine's single-precision build.
#[derive(Default, Copy, Clone, PartialEq, Debug)]
#[repr(C)]
pub struct Vector2 {
    /// The vector's X component.
    pub x: f32,

    /// The vector's Y component.
    pub y: f32,
}

/// Vector used for 3D math using floating point coordinates.
#[derive(Default, Copy, Clone, PartialEq, Debug)]
#[repr(C)]
pub struct Vector3 {
    /// The vector's X component.
    pub x: f32,

    /// The vector's Y component.
    pub y: f32,

    /// The vector's Z component.
    pub z: f32,
}

impl Vector2 {
    /// Vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);

    /// Vector with all components set to `1.0`.
    pub const ONE: Self = Self::splat(1.0);

    /// Unit vector in +X direction.
    pub const RIGHT: Self = Self::new(1.0, 0.0);

    /// Unit vector in -Y direction (up in 2D coordinate system).
    pub const UP: Self = Self::new(0.0, -1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v)
    }

    /// Converts the corresponding `glam` type to `Self`.
    pub fn from_glam(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }

    /// Converts `self` to the corresponding `glam` type.
    pub fn to_glam(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn length(self) -> f32 {
        self.to_glam().length()
    }

    pub fn dot(self, with: Self) -> f32 {
        self.to_glam().dot(with.to_glam())
    }

    /// Returns the vector scaled to unit length, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        Self::from_glam(self.to_glam().normalize_or_zero())
    }

    pub fn lerp(self, to: Self, weight: f32) -> Self {
        Self::from_glam(self.to_glam().lerp(to.to_glam(), weight))
    }

    /// Rotates by `angle` radians.
    pub fn rotated(self, angle: f32) -> Self {
        Self::from_glam(Vec2::from_angle(angle).rotate(self.to_glam()))
    }

    pub fn is_equal_approx(self, other: Self) -> bool {
        self.to_glam().abs_diff_eq(other.to_glam(), f32::EPSILON * 4.0)
    }
}

impl Vector3 {
    /// Vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);

    /// Vector with all components set to `1.0`.
    pub const ONE: Self = Self::splat(1.0);

    /// Unit vector in +Y direction.
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector in -Z direction.
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Converts the corresponding `glam` type to `Self`.
    pub fn from_glam(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Converts `self` to the corresponding `glam` type.
    pub fn to_glam(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn length(self) -> f32 {
        self.to_glam().length()
    }

    pub fn dot(self, with: Self) -> f32 {
        self.to_glam().dot(with.to_glam())
    }

    pub fn cross(self, with: Self) -> Self {
        Self::from_glam(self.to_glam().cross(with.to_glam()))
    }

    /// Returns the vector scaled to unit length, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        Self::from_glam(self.to_glam().normalize_or_zero())
    }

    pub fn lerp(self, to: Self, weight: f32) -> Self {
        Self::from_glam(self.to_glam().lerp(to.to_glam(), weight))
    }

    pub fn is_equal_approx(self, other: Self) -> bool {
        self.to_glam().abs_diff_eq(other.to_glam(), f32::EPSILON * 4.0)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Operators, delegated to glam

macro_rules! impl_vector_operators {
    ($Vector:ident) => {
        impl Add for $Vector {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self::from_glam(self.to_glam() + rhs.to_glam())
            }
        }

        impl AddAssign for $Vector {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl Sub for $Vector {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self::from_glam(self.to_glam() - rhs.to_glam())
            }
        }

        impl SubAssign for $Vector {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl Mul<f32> for $Vector {
            type Output = Self;

            fn mul(self, rhs: f32) -> Self {
                Self::from_glam(self.to_glam() * rhs)
            }
        }

        impl Div<f32> for $Vector {
            type Output = Self;

            fn div(self, rhs: f32) -> Self {
                Self::from_glam(self.to_glam() / rhs)
            }
        }

        impl Neg for $Vector {
            type Output = Self;

            fn neg(self) -> Self {
                Self::from_glam(-self.to_glam())
            }
        }
    };
}

impl_vector_operators!(Vector2);
impl_vector_operators!(Vector3);

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl_builtin_pod!(Vector2, Vector3);

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -1.0);

        assert_eq!(a + b, Vector2::new(4.0, 1.0));
        assert_eq!(a - b, Vector2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));
    }

    #[test]
    fn length_and_normalize() {
        let v = Vector3::new(3.0, 0.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert!(v.normalized().is_equal_approx(Vector3::new(0.6, 0.0, 0.8)));
        assert_eq!(Vector3::ZERO.normalized(), Vector3::ZERO);
    }

    #[test]
    fn cross_product() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::UP;
        assert_eq!(x.cross(y), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn rotation() {
        let rotated = Vector2::RIGHT.rotated(std::f32::consts::FRAC_PI_2);
        assert!(rotated.is_equal_approx(Vector2::new(0.0, 1.0)));
    }

    #[test]
    fn layout_matches_engine() {
        assert_eq!(std::mem::size_of::<Vector2>(), 8);
        assert_eq!(std::mem::size_of::<Vector3>(), 12);
    }
}
