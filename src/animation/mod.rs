pub mod geometry;
pub mod motion;
pub mod registry;
pub mod scheduler;
pub mod timeline;

// Re-export commonly used types and functions for convenience
pub use geometry::{rasterize_segment, TransformDescriptor};
pub use motion::{CompiledMotion, Frame, MarkerGeometry, VisualState};
pub use registry::BouncingRegistry;
pub use scheduler::{BounceScheduler, BounceState, Cycles, Transition};
pub use timeline::{compute_delays, compute_steps, Phase, Timeline, TimelineCache};
