//! Shared trait abstractions
//!
//! Small traits that let the geometry and caching code share one vocabulary.

use crate::core::geo::Point;

/// Unified matrix transformation operations
///
/// Matrices are 2D affine `[a, b, c, d, e, f]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
pub trait MatrixTransform {
    /// Apply 2D transformation matrix
    fn apply_transform(&self, matrix: &[f64; 6]) -> Self;

    /// Create transformation matrix from translation and per-axis scale
    fn create_transform_matrix(translate: Point, scale_x: f64, scale_y: f64) -> [f64; 6] {
        [scale_x, 0.0, 0.0, scale_y, translate.x, translate.y]
    }
}

impl MatrixTransform for Point {
    fn apply_transform(&self, m: &[f64; 6]) -> Self {
        Point::new(
            m[0] * self.x + m[2] * self.y + m[4],
            m[1] * self.x + m[3] * self.y + m[5],
        )
    }
}

/// Trait for memoizing caches
///
/// Entries are write-once: `cache` keeps the first value stored for a key,
/// so racing writers that computed the same value are harmless.
pub trait Cacheable {
    type Key: Clone + Eq + std::hash::Hash;
    type Value: Clone;

    /// Get cached value
    fn get_cached(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Cache a value unless one is already present; returns the stored value
    fn cache(&self, key: Self::Key, value: Self::Value) -> Self::Value;

    /// Get cache statistics
    fn cache_stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}
