//! Pixel geometry for bounce states
//!
//! Everything here is a pure function of its inputs. The timeline cache and
//! the compiled motions rely on identical inputs producing bit-identical
//! outputs, so no floating point result escapes without being rounded or
//! built from exact operations.

use crate::core::geo::{PixelPoint, Point};
use crate::traits::MatrixTransform;
use crate::{BounceError, Result};
use serde::{Deserialize, Serialize};

/// Rasterizes `length` pixels of the ray leaving `origin` at `angle` radians.
///
/// The ray is traced towards a target `2 * length` pixels away, which keeps
/// the slope stable for very short shadows, and the first `length` pixels of
/// the Bresenham walk are returned. The first point is always `origin`.
pub fn rasterize_segment(origin: PixelPoint, angle: f64, length: u32) -> Result<Vec<PixelPoint>> {
    if length == 0 {
        return Err(BounceError::InvalidExtent {
            option: "segment length",
            value: 0,
        });
    }

    let reach = 2.0 * length as f64;
    let target_x = origin.x as i64 + (reach * angle.cos()).round() as i64;
    let target_y = origin.y as i64 + (reach * angle.sin()).round() as i64;

    let (mut x, mut y) = (origin.x as i64, origin.y as i64);
    let dx = (target_x - x).abs();
    let dy = -(target_y - y).abs();
    let sx = if x < target_x { 1 } else { -1 };
    let sy = if y < target_y { 1 } else { -1 };
    let mut err = dx + dy;

    let mut points = Vec::with_capacity(length as usize);
    loop {
        points.push(PixelPoint::new(x as i32, y as i32));
        if points.len() == length as usize {
            return Ok(points);
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// A 2D affine transform `[a, b, c, d, e, f]` applied to an icon or shadow
/// element whose transform origin is its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    pub matrix: [f64; 6],
}

impl TransformDescriptor {
    /// Identity scale, translated to `(x, y)`
    pub fn translate(at: PixelPoint) -> Self {
        Self::scale(at, 1.0, 1.0)
    }

    /// Vertical-only scale by `factor`, translated to `(x, y)`
    pub fn scale_y(at: PixelPoint, factor: f64) -> Self {
        Self::scale(at, 1.0, factor)
    }

    /// Independent horizontal and vertical scale, translated to `(x, y)`
    pub fn scale(at: PixelPoint, scale_x: f64, scale_y: f64) -> Self {
        Self {
            matrix: Point::create_transform_matrix(at.into(), scale_x, scale_y),
        }
    }

    pub fn translation(&self) -> Point {
        Point::new(self.matrix[4], self.matrix[5])
    }

    pub fn scale_factors(&self) -> (f64, f64) {
        (self.matrix[0], self.matrix[3])
    }

    /// Maps a point in element-local pixels to screen pixels
    pub fn apply(&self, local: Point) -> Point {
        local.apply_transform(&self.matrix)
    }

    /// CSS value for the hardware-accelerated path
    pub fn to_css(&self) -> String {
        let [a, b, c, d, e, f] = self.matrix;
        format!("matrix3d({a}, {b}, 0, 0, {c}, {d}, 0, 0, 0, 0, 1, 0, {e}, {f}, 0, 1)")
    }
}
