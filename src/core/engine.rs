//! The bounce engine: markers, their configs, the bouncing registry and the
//! timer queue that plays every phase.
//!
//! All state lives in one owned struct and every callback runs on the
//! engine's own queue, so no locking is needed inside. Wrap the engine in a
//! [`crate::driver::BounceDriver`] to run it against real time.

use crate::{
    animation::{
        motion::{CompiledMotion, MarkerGeometry},
        registry::BouncingRegistry,
        scheduler::{BounceScheduler, BounceState, Cycles, Transition},
        timeline::{Phase, Timeline, TimelineCache},
    },
    core::{
        config::{AnimationConfig, BounceOptions},
        geo::PixelPoint,
    },
    layers::{
        marker::{Attachment, BouncingMarker, MarkerId},
        surface::RenderSurface,
    },
    prelude::{Arc, HashMap},
    runtime::TimerQueue,
    BounceError, Result,
};

/// Arguments of a single `bounce` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BounceRequest {
    pub cycles: Cycles,
    /// Bounce exclusively even if the marker's options say otherwise
    pub exclusive: bool,
}

impl BounceRequest {
    pub fn new(cycles: Cycles) -> Self {
        Self {
            cycles,
            exclusive: false,
        }
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// Callbacks queued on the engine's timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BounceTask {
    Step {
        marker: MarkerId,
        generation: u64,
        phase: Phase,
        index: usize,
    },
    PhaseEnd {
        marker: MarkerId,
        generation: u64,
        phase: Phase,
    },
    Resume {
        marker: MarkerId,
        generation: u64,
    },
}

impl BounceTask {
    fn marker(&self) -> MarkerId {
        match *self {
            BounceTask::Step { marker, .. }
            | BounceTask::PhaseEnd { marker, .. }
            | BounceTask::Resume { marker, .. } => marker,
        }
    }
}

pub struct BounceEngine<S: RenderSurface> {
    surface: S,
    transforms: bool,
    defaults: AnimationConfig,
    markers: HashMap<MarkerId, BouncingMarker>,
    registry: BouncingRegistry,
    timelines: Arc<TimelineCache>,
    timers: TimerQueue<BounceTask>,
    next_marker: u64,
    next_generation: u64,
}

impl<S: RenderSurface> BounceEngine<S> {
    /// Creates an engine backed by the process-wide timeline cache
    pub fn new(surface: S) -> Self {
        Self::with_cache(surface, TimelineCache::global())
    }

    pub fn with_cache(surface: S, timelines: Arc<TimelineCache>) -> Self {
        let transforms = surface.supports_3d_transforms();
        if !transforms {
            log::info!("surface has no transform support, markers will bounce without contracting");
        }

        Self {
            surface,
            transforms,
            defaults: AnimationConfig::default(),
            markers: HashMap::default(),
            registry: BouncingRegistry::new(),
            timelines,
            timers: TimerQueue::new(),
            next_marker: 0,
            next_generation: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn supports_transforms(&self) -> bool {
        self.transforms
    }

    pub fn timeline_cache(&self) -> &Arc<TimelineCache> {
        &self.timelines
    }

    pub fn default_options(&self) -> AnimationConfig {
        self.defaults
    }

    /// Merges `options` into the defaults. Markers that were never given
    /// their own options pick the change up immediately.
    pub fn set_default_options(&mut self, options: &BounceOptions) -> Result<()> {
        let defaults = self.defaults.merged(options)?;
        self.warn_if_elastic_unsupported(options, "default options");
        self.defaults = defaults;

        let followers: Vec<MarkerId> = self
            .markers
            .values()
            .filter(|marker| !marker.has_own_options())
            .map(|marker| marker.id())
            .collect();
        for id in followers {
            self.rebuild(id, None)?;
        }
        Ok(())
    }

    pub fn set_default_options_json(&mut self, options: serde_json::Value) -> Result<()> {
        self.set_default_options(&BounceOptions::from_json(options)?)
    }

    /// Options `marker` currently bounces with. `elastic` reads `false` on
    /// surfaces without transform support, where no resize phase is played.
    pub fn options(&self, marker: MarkerId) -> Result<AnimationConfig> {
        let mut config = self.marker(marker)?.effective_options(&self.defaults);
        config.elastic &= self.transforms;
        Ok(config)
    }

    /// Gives `marker` its own options: the first call copies the current
    /// defaults, later calls merge into the marker's copy.
    pub fn set_options(&mut self, marker: MarkerId, options: &BounceOptions) -> Result<()> {
        let config = self
            .marker(marker)?
            .effective_options(&self.defaults)
            .merged(options)?;
        self.warn_if_elastic_unsupported(options, "marker options");
        self.rebuild(marker, Some(config))
    }

    pub fn set_options_json(&mut self, marker: MarkerId, options: serde_json::Value) -> Result<()> {
        self.set_options(marker, &BounceOptions::from_json(options)?)
    }

    pub fn create_marker(&mut self) -> MarkerId {
        self.next_marker += 1;
        let id = MarkerId(self.next_marker);
        let timeline = self.timelines.timeline(&self.defaults);
        self.markers
            .insert(id, BouncingMarker::new(id, None, timeline));
        id
    }

    pub fn create_marker_with_options(&mut self, options: &BounceOptions) -> Result<MarkerId> {
        let config = self.defaults.merged(options)?;
        let id = self.create_marker();
        self.rebuild(id, Some(config))?;
        Ok(id)
    }

    /// Puts `marker` on the surface (or updates its geometry if it already is)
    pub fn attach(&mut self, marker: MarkerId, geometry: MarkerGeometry) -> Result<()> {
        let transforms = self.transforms;
        let defaults = self.defaults;
        let entry = self
            .markers
            .get_mut(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;

        let motion =
            CompiledMotion::compile(&geometry, &entry.effective_options(&defaults), transforms)?;
        match entry.attachment_mut() {
            Some(attachment) => {
                attachment.geometry = geometry;
                attachment.motion = motion;
            }
            None => entry.attach(Attachment {
                geometry,
                motion,
                scheduler: BounceScheduler::new(),
            }),
        }
        log::debug!("{} attached at {:?}", marker, geometry.position);
        Ok(())
    }

    /// Recompiles the motion of `marker` for a new resting position
    pub fn set_position(&mut self, marker: MarkerId, position: PixelPoint) -> Result<()> {
        let transforms = self.transforms;
        let defaults = self.defaults;
        let entry = self
            .markers
            .get_mut(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;
        let config = entry.effective_options(&defaults);
        let attachment = entry
            .attachment_mut()
            .ok_or(BounceError::NotAttached(marker))?;

        let geometry = MarkerGeometry {
            position,
            ..attachment.geometry
        };
        attachment.motion = CompiledMotion::compile(&geometry, &config, transforms)?;
        attachment.geometry = geometry;
        Ok(())
    }

    /// Takes `marker` off the surface. Its animation state is dropped and
    /// callbacks still queued for it do nothing when they fire.
    pub fn detach(&mut self, marker: MarkerId) -> Result<()> {
        let entry = self
            .markers
            .get_mut(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;
        if entry.detach().is_some() {
            self.registry.remove(marker);
            log::debug!("{} detached", marker);
        }
        Ok(())
    }

    /// Forgets `marker` entirely
    pub fn remove_marker(&mut self, marker: MarkerId) -> Result<()> {
        self.markers
            .remove(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;
        self.registry.remove(marker);
        self.timers.retain(|task| task.marker() != marker);
        Ok(())
    }

    pub fn is_attached(&self, marker: MarkerId) -> bool {
        self.markers
            .get(&marker)
            .map(BouncingMarker::is_attached)
            .unwrap_or(false)
    }

    pub fn markers(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self.markers.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Step and delay schedules `marker` bounces with
    pub fn timeline(&self, marker: MarkerId) -> Result<Timeline> {
        Ok(self.marker(marker)?.timeline().clone())
    }

    pub fn bounce(&mut self, marker: MarkerId, cycles: Cycles) -> Result<()> {
        self.bounce_with(marker, BounceRequest::new(cycles))
    }

    /// Starts bouncing `marker`. A marker that is already bouncing keeps
    /// its current run.
    pub fn bounce_with(&mut self, marker: MarkerId, request: BounceRequest) -> Result<()> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let defaults = self.defaults;

        let entry = self
            .markers
            .get_mut(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;
        let exclusive = request.exclusive || entry.effective_options(&defaults).exclusive;
        let attachment = entry
            .attachment_mut()
            .ok_or(BounceError::NotAttached(marker))?;

        if !attachment.scheduler.start(request.cycles, generation) {
            log::debug!("{} is already bouncing", marker);
            return Ok(());
        }

        for evicted in self.registry.add(marker, exclusive) {
            log::debug!("{} stopped by exclusive bounce of {}", evicted, marker);
            self.halt(evicted);
        }
        log::debug!("{} starts bouncing ({:?})", marker, request.cycles);
        self.begin_phase(marker, Phase::Move);
        Ok(())
    }

    /// Stops `marker` after the phase it is currently playing
    pub fn stop_bouncing(&mut self, marker: MarkerId) -> Result<()> {
        self.marker(marker)?;
        if self.halt(marker) {
            self.registry.remove(marker);
            log::debug!("{} stops bouncing", marker);
        }
        Ok(())
    }

    /// Stops a bouncing marker or starts an idle one. Returns whether the
    /// marker is bouncing afterwards.
    pub fn toggle_bouncing(&mut self, marker: MarkerId) -> Result<bool> {
        if self.is_bouncing(marker) {
            self.stop_bouncing(marker)?;
        } else {
            self.bounce(marker, Cycles::Unbounded)?;
        }
        Ok(self.is_bouncing(marker))
    }

    pub fn is_bouncing(&self, marker: MarkerId) -> bool {
        self.markers
            .get(&marker)
            .map(BouncingMarker::is_bouncing)
            .unwrap_or(false)
    }

    pub fn state(&self, marker: MarkerId) -> Result<BounceState> {
        Ok(self
            .marker(marker)?
            .attachment()
            .map(|attachment| attachment.scheduler.state())
            .unwrap_or(BounceState::Idle))
    }

    /// Bouncing markers in the order they started
    pub fn bouncing_markers(&self) -> Vec<MarkerId> {
        self.registry.markers()
    }

    pub fn stop_all_bouncing(&mut self) {
        for marker in self.registry.drain() {
            self.halt(marker);
        }
        log::debug!("stopped all bouncing markers");
    }

    /// Engine time in milliseconds
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.timers.len()
    }

    /// Fires every callback due up to `time_ms` and moves the clock there.
    /// Returns the number of callbacks fired.
    pub fn advance_to(&mut self, time_ms: u64) -> usize {
        let mut fired = 0;
        while let Some(task) = self.timers.pop_due(time_ms) {
            self.run(task);
            fired += 1;
        }
        self.timers.advance_clock(time_ms);
        fired
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> usize {
        self.advance_to(self.now().saturating_add(delta_ms))
    }

    fn marker(&self, marker: MarkerId) -> Result<&BouncingMarker> {
        self.markers
            .get(&marker)
            .ok_or(BounceError::UnknownMarker(marker))
    }

    /// Recomputes timeline and motion of `marker`, optionally replacing its
    /// own options. Nothing is committed unless compilation succeeds.
    fn rebuild(&mut self, marker: MarkerId, own: Option<AnimationConfig>) -> Result<()> {
        let transforms = self.transforms;
        let defaults = self.defaults;
        let entry = self
            .markers
            .get_mut(&marker)
            .ok_or(BounceError::UnknownMarker(marker))?;

        let config = own.unwrap_or_else(|| entry.effective_options(&defaults));
        let motion = match entry.attachment() {
            Some(attachment) => Some(CompiledMotion::compile(
                &attachment.geometry,
                &config,
                transforms,
            )?),
            None => None,
        };

        if let Some(own) = own {
            entry.set_options(own);
        }
        entry.set_timeline(self.timelines.timeline(&config));
        if let (Some(motion), Some(attachment)) = (motion, entry.attachment_mut()) {
            attachment.motion = motion;
        }
        Ok(())
    }

    /// Clears the bouncing flag; returns whether it was set
    fn halt(&mut self, marker: MarkerId) -> bool {
        self.markers
            .get_mut(&marker)
            .and_then(BouncingMarker::attachment_mut)
            .map(|attachment| attachment.scheduler.stop())
            .unwrap_or(false)
    }

    fn begin_phase(&mut self, marker: MarkerId, phase: Phase) {
        let Some(entry) = self.markers.get_mut(&marker) else {
            return;
        };
        let timeline = entry.timeline().clone();
        let Some(attachment) = entry.attachment_mut() else {
            return;
        };
        attachment.scheduler.begin_phase(phase);
        let generation = attachment.scheduler.generation();

        log::debug!(
            "{} begins {} phase ({} steps over {}ms)",
            marker,
            phase,
            timeline.steps(phase).len(),
            timeline.duration(phase)
        );
        for (index, delay) in timeline.delays(phase).iter().enumerate() {
            self.timers.schedule(
                *delay,
                BounceTask::Step {
                    marker,
                    generation,
                    phase,
                    index,
                },
            );
        }
        // Queued after the steps, so it runs after the last one even when
        // their due times are equal
        self.timers.schedule(
            timeline.duration(phase),
            BounceTask::PhaseEnd {
                marker,
                generation,
                phase,
            },
        );
    }

    fn run(&mut self, task: BounceTask) {
        match task {
            BounceTask::Step {
                marker,
                generation,
                phase,
                index,
            } => self.apply_step(marker, generation, phase, index),
            BounceTask::PhaseEnd {
                marker,
                generation,
                phase,
            } => self.finish_phase(marker, generation, phase),
            BounceTask::Resume { marker, generation } => self.resume(marker, generation),
        }
    }

    fn apply_step(&mut self, marker: MarkerId, generation: u64, phase: Phase, index: usize) {
        let Some(entry) = self.markers.get(&marker) else {
            return;
        };
        // Detached markers and superseded runs are skipped
        let Some(attachment) = entry
            .attachment()
            .filter(|a| a.scheduler.generation() == generation)
        else {
            return;
        };
        let Some(frame) = entry
            .timeline()
            .steps(phase)
            .get(index)
            .and_then(|step| attachment.motion.frame(phase, *step))
        else {
            return;
        };
        self.surface.apply_frame(marker, &frame);
    }

    fn finish_phase(&mut self, marker: MarkerId, generation: u64, phase: Phase) {
        let defaults = self.defaults;
        let Some(entry) = self.markers.get_mut(&marker) else {
            return;
        };
        let config = entry.effective_options(&defaults);
        let Some(attachment) = entry
            .attachment_mut()
            .filter(|a| a.scheduler.generation() == generation)
        else {
            return;
        };

        let resize = config.elastic && attachment.motion.supports_resize();
        let transition = attachment
            .scheduler
            .finish_phase(phase, resize, config.bounce_speed);
        if !attachment.scheduler.is_bouncing() {
            self.registry.remove(marker);
        }

        match transition {
            Transition::Begin(next) => self.begin_phase(marker, next),
            Transition::Pause(delay) => {
                self.timers
                    .schedule(delay, BounceTask::Resume { marker, generation });
            }
            Transition::Settle => self.settle(marker),
        }
    }

    fn resume(&mut self, marker: MarkerId, generation: u64) {
        let Some(attachment) = self
            .markers
            .get_mut(&marker)
            .and_then(BouncingMarker::attachment_mut)
            .filter(|a| a.scheduler.generation() == generation)
        else {
            return;
        };

        if attachment.scheduler.resume() {
            self.begin_phase(marker, Phase::Move);
        } else {
            self.settle(marker);
        }
    }

    fn settle(&mut self, marker: MarkerId) {
        log::debug!("{} came to rest", marker);
        self.surface.bounce_ended(marker);
    }

    fn warn_if_elastic_unsupported(&self, options: &BounceOptions, target: &str) {
        if options.elastic == Some(true) && !self.transforms {
            log::warn!(
                "elastic bouncing needs transform support; {} will bounce without contracting",
                target
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Size;
    use crate::layers::surface::RecordingSurface;

    fn engine() -> BounceEngine<RecordingSurface> {
        BounceEngine::with_cache(RecordingSurface::new(true), Arc::new(TimelineCache::new()))
    }

    fn geometry() -> MarkerGeometry {
        MarkerGeometry::new(PixelPoint::new(100, 100), Size::new(25, 41))
            .with_shadow(Size::new(41, 41))
    }

    #[test]
    fn test_bounce_requires_attachment() {
        let mut engine = engine();
        let marker = engine.create_marker();

        assert!(matches!(
            engine.bounce(marker, Cycles::Unbounded),
            Err(BounceError::NotAttached(m)) if m == marker
        ));
        assert!(matches!(
            engine.set_position(marker, PixelPoint::new(1, 1)),
            Err(BounceError::NotAttached(_))
        ));
        assert!(matches!(
            engine.bounce(MarkerId(999), Cycles::Unbounded),
            Err(BounceError::UnknownMarker(_))
        ));
    }

    #[test]
    fn test_rejected_options_leave_marker_untouched() {
        let mut engine = engine();
        let marker = engine.create_marker();

        let result = engine.set_options(marker, &BounceOptions::new().bounce_height(0));
        assert!(matches!(result, Err(BounceError::InvalidExtent { .. })));
        assert_eq!(engine.options(marker).unwrap(), AnimationConfig::default());
    }

    #[test]
    fn test_out_of_range_options_are_rejected_on_attached_marker() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine.attach(marker, geometry()).unwrap();

        assert!(matches!(
            engine.set_options(marker, &BounceOptions::new().bounce_height(u32::MAX as i64)),
            Err(BounceError::InvalidExtent { .. })
        ));
        assert!(matches!(
            engine.set_options(marker, &BounceOptions::new().bounce_speed(i64::MAX)),
            Err(BounceError::InvalidSpeed { .. })
        ));
        assert_eq!(engine.options(marker).unwrap(), AnimationConfig::default());
        assert_eq!(engine.timeline(marker).unwrap().move_steps.len(), 30);
    }

    #[test]
    fn test_default_options_reach_only_following_markers() {
        let mut engine = engine();
        let follower = engine.create_marker();
        let custom = engine.create_marker();
        engine
            .set_options(custom, &BounceOptions::new().bounce_speed(80))
            .unwrap();

        engine
            .set_default_options(&BounceOptions::new().bounce_height(25))
            .unwrap();

        assert_eq!(engine.options(follower).unwrap().bounce_height, 25);
        assert_eq!(engine.timeline(follower).unwrap().move_steps.len(), 50);
        assert_eq!(engine.options(custom).unwrap().bounce_height, 15);
        assert_eq!(engine.options(custom).unwrap().bounce_speed, 80);
    }

    #[test]
    fn test_second_set_options_merges_into_own_copy() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine
            .set_options(marker, &BounceOptions::new().bounce_height(30))
            .unwrap();
        engine
            .set_default_options(&BounceOptions::new().contract_height(4))
            .unwrap();
        engine
            .set_options(marker, &BounceOptions::new().elastic(false))
            .unwrap();

        let options = engine.options(marker).unwrap();
        assert_eq!(options.bounce_height, 30);
        assert_eq!(options.contract_height, 12);
        assert!(!options.elastic);
    }

    #[test]
    fn test_elastic_is_reported_off_without_transforms() {
        let mut engine =
            BounceEngine::with_cache(RecordingSurface::new(false), Arc::new(TimelineCache::new()));
        let marker = engine
            .create_marker_with_options(&BounceOptions::new().elastic(true))
            .unwrap();

        assert!(!engine.options(marker).unwrap().elastic);
        // the requested value is kept in case the marker is ever recompiled
        engine
            .set_options(marker, &BounceOptions::new().bounce_height(20))
            .unwrap();
        assert!(!engine.options(marker).unwrap().elastic);
        assert!(engine.default_options().elastic);
    }

    #[test]
    fn test_bounce_twice_does_not_double_register() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine.attach(marker, geometry()).unwrap();

        engine.bounce(marker, Cycles::Unbounded).unwrap();
        let pending = engine.pending_callbacks();
        engine.bounce(marker, Cycles::Unbounded).unwrap();

        assert_eq!(engine.bouncing_markers(), vec![marker]);
        assert_eq!(engine.pending_callbacks(), pending);
    }

    #[test]
    fn test_detached_marker_callbacks_are_noops() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine.attach(marker, geometry()).unwrap();
        engine.bounce(marker, Cycles::Unbounded).unwrap();
        engine.advance_by(20);
        let drawn = engine.surface().frames.len();

        engine.detach(marker).unwrap();
        assert!(!engine.is_bouncing(marker));
        assert!(engine.bouncing_markers().is_empty());

        engine.advance_by(2_000);
        assert_eq!(engine.surface().frames.len(), drawn);
        assert_eq!(engine.pending_callbacks(), 0);
    }

    #[test]
    fn test_remove_marker_purges_callbacks() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine.attach(marker, geometry()).unwrap();
        engine.bounce(marker, Cycles::Unbounded).unwrap();

        engine.remove_marker(marker).unwrap();
        assert_eq!(engine.pending_callbacks(), 0);
        assert!(matches!(
            engine.remove_marker(marker),
            Err(BounceError::UnknownMarker(_))
        ));
    }

    #[test]
    fn test_restart_while_settling_supersedes_old_run() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine
            .set_options(marker, &BounceOptions::new().elastic(false))
            .unwrap();
        engine.attach(marker, geometry()).unwrap();

        engine.bounce(marker, Cycles::Unbounded).unwrap();
        engine.advance_to(100);
        engine.stop_bouncing(marker).unwrap();
        assert!(matches!(
            engine.state(marker).unwrap(),
            BounceState::Settling(Phase::Move)
        ));

        engine.bounce(marker, Cycles::Times(std::num::NonZeroU32::new(1).unwrap()))
            .unwrap();
        let before = engine.surface().frames.len();
        // the restarted move takes 390ms; the superseded one would have
        // kept drawing until 390ms too
        engine.advance_to(100 + 390);
        assert_eq!(engine.surface().frames.len() - before, 30);
        assert_eq!(engine.surface().ended, vec![marker]);
    }

    #[test]
    fn test_set_position_recompiles_motion() {
        let mut engine = engine();
        let marker = engine.create_marker();
        engine.attach(marker, geometry()).unwrap();
        engine.set_position(marker, PixelPoint::new(10, 500)).unwrap();

        engine.bounce(marker, Cycles::Unbounded).unwrap();
        engine.advance_to(0);
        let (_, frame) = engine.surface().frames[0];
        assert_eq!(frame.z_index, 500);
    }
}
