//! The host side of bouncing: whatever actually draws the marker.

use crate::animation::motion::Frame;
use crate::layers::marker::MarkerId;

/// Rendering host a bounce engine drives
pub trait RenderSurface {
    /// Whether icon and shadow can be positioned with full transforms.
    /// Queried once, when the engine is created.
    fn supports_3d_transforms(&self) -> bool;

    /// Applies one step of a marker's animation
    fn apply_frame(&mut self, marker: MarkerId, frame: &Frame);

    /// Called once a marker has come to rest after its last phase
    fn bounce_ended(&mut self, _marker: MarkerId) {}
}

/// Headless surface that records everything it is asked to draw
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    transforms: bool,
    pub frames: Vec<(MarkerId, Frame)>,
    pub ended: Vec<MarkerId>,
}

impl RecordingSurface {
    pub fn new(transforms: bool) -> Self {
        Self {
            transforms,
            ..Self::default()
        }
    }

    pub fn frames_for(&self, marker: MarkerId) -> Vec<Frame> {
        self.frames
            .iter()
            .filter(|(id, _)| *id == marker)
            .map(|(_, frame)| *frame)
            .collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.ended.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn supports_3d_transforms(&self) -> bool {
        self.transforms
    }

    fn apply_frame(&mut self, marker: MarkerId, frame: &Frame) {
        self.frames.push((marker, *frame));
    }

    fn bounce_ended(&mut self, marker: MarkerId) {
        self.ended.push(marker);
    }
}
