//! # maplet-bounce
//!
//! Smooth bouncing for map markers, in the spirit of Leaflet's bouncing
//! marker plugins.
//!
//! A bounce is precomputed pixel by pixel: the icon climbs and falls back
//! one pixel per step while its shadow slides along the shadow angle, and on
//! transform-capable surfaces the icon then squashes against the ground.
//! Steps are paced by a non-uniform delay schedule that slows into the apex
//! and speeds out of it. [`BounceEngine`] owns the markers and plays those
//! schedules on its timer queue, handing every frame to a [`RenderSurface`].

pub mod animation;
pub mod core;
#[cfg(feature = "tokio-runtime")]
pub mod driver;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{AnimationConfig, BounceOptions},
    engine::{BounceEngine, BounceRequest},
    geo::{PixelPoint, Point, Size},
};

pub use animation::{
    BounceState, CompiledMotion, Cycles, Frame, MarkerGeometry, Phase, Timeline, TimelineCache,
    TransformDescriptor, VisualState,
};

pub use layers::{
    marker::MarkerId,
    surface::{RecordingSurface, RenderSurface},
};

#[cfg(feature = "tokio-runtime")]
pub use driver::BounceDriver;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, BounceError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum BounceError {
    #[error("Invalid extent for {option}: {value} (must be between 1 and {} pixels)", constants::MAX_EXTENT)]
    InvalidExtent { option: &'static str, value: i64 },

    #[error("Invalid speed for {option}: {value} (must be between 1 and {} milliseconds)", constants::MAX_SPEED)]
    InvalidSpeed { option: &'static str, value: i64 },

    #[error("{0} is not attached to a surface")]
    NotAttached(layers::marker::MarkerId),

    #[error("Unknown marker: {0}")]
    UnknownMarker(layers::marker::MarkerId),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = BounceError;
