use crate::{
    animation::{
        motion::{CompiledMotion, MarkerGeometry},
        scheduler::BounceScheduler,
        timeline::Timeline,
    },
    core::config::AnimationConfig,
};
use serde::{Deserialize, Serialize};

/// Opaque handle of a marker known to a bounce engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// State that only exists while the marker is on the surface
#[derive(Debug, Clone)]
pub struct Attachment {
    pub geometry: MarkerGeometry,
    pub motion: CompiledMotion,
    pub scheduler: BounceScheduler,
}

pub struct BouncingMarker {
    id: MarkerId,
    /// Own copy of the options once customised; `None` follows the defaults
    options: Option<AnimationConfig>,
    timeline: Timeline,
    attachment: Option<Attachment>,
}

impl BouncingMarker {
    pub fn new(id: MarkerId, options: Option<AnimationConfig>, timeline: Timeline) -> Self {
        Self {
            id,
            options,
            timeline,
            attachment: None,
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Options this marker bounces with, given the current defaults
    pub fn effective_options(&self, defaults: &AnimationConfig) -> AnimationConfig {
        self.options.unwrap_or(*defaults)
    }

    pub fn has_own_options(&self) -> bool {
        self.options.is_some()
    }

    pub fn set_options(&mut self, options: AnimationConfig) {
        self.options = Some(options);
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.timeline = timeline;
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn attachment_mut(&mut self) -> Option<&mut Attachment> {
        self.attachment.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
    }

    pub fn detach(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    pub fn is_bouncing(&self) -> bool {
        self.attachment
            .as_ref()
            .map(|a| a.scheduler.is_bouncing())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for BouncingMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BouncingMarker")
            .field("id", &self.id)
            .field("own_options", &self.options.is_some())
            .field("attached", &self.attachment.is_some())
            .field("bouncing", &self.is_bouncing())
            .finish()
    }
}
