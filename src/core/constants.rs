//! Bounce defaults derived from the classic smooth-marker-bouncing behaviour
//! and Leaflet's default marker icon. Keeping them in a single place makes it
//! easier to tweak engine-wide magic numbers.

use std::f64::consts::FRAC_PI_4;

/// How high the icon jumps, in pixels.
pub const DEFAULT_BOUNCE_HEIGHT: u32 = 15;

/// How far the icon squashes when it lands, in pixels.
pub const DEFAULT_CONTRACT_HEIGHT: u32 = 12;

/// Base pacing of the jump (ms). Also the pause between non-elastic bounces.
pub const DEFAULT_BOUNCE_SPEED: u64 = 52;

/// Base pacing of the contraction (ms).
pub const DEFAULT_CONTRACT_SPEED: u64 = 52;

/// Direction the shadow is cast in, radians (screen y grows downwards).
pub const DEFAULT_SHADOW_ANGLE: f64 = -FRAC_PI_4;

/// Largest accepted bounce or contract height, in pixels.
pub const MAX_EXTENT: u32 = 10_000;

/// Largest accepted bounce or contract speed, in milliseconds.
pub const MAX_SPEED: u64 = 60_000;

/// Marker icon default size (regular PNG).
pub const MARKER_ICON_SIZE: (u32, u32) = (25, 41);

/// Marker shadow default size.
pub const MARKER_SHADOW_SIZE: (u32, u32) = (41, 41);
