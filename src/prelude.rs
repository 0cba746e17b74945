//! Prelude module for common maplet-bounce types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_bounce::prelude::*;`

pub use crate::core::{
    config::{AnimationConfig, BounceOptions},
    engine::{BounceEngine, BounceRequest},
    geo::{PixelPoint, Point, Size},
};

pub use crate::animation::{
    BounceState, Cycles, Frame, MarkerGeometry, Phase, Timeline, TimelineCache,
    TransformDescriptor, VisualState,
};

pub use crate::layers::{
    marker::MarkerId,
    surface::{RecordingSurface, RenderSurface},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::driver::BounceDriver;

pub use crate::{BounceError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::FxHashMap as HashMap;
