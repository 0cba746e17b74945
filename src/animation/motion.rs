//! Per-marker visual states
//!
//! A compiled motion holds one visual state per step value of each phase, so
//! `states[step]` is what gets applied when the timeline reaches `step`. It
//! depends on the marker's resting position and image sizes and is rebuilt
//! whenever either of them, or the bounce config, changes.

use crate::animation::geometry::{rasterize_segment, TransformDescriptor};
use crate::animation::timeline::Phase;
use crate::core::config::AnimationConfig;
use crate::core::geo::{PixelPoint, Size};
use crate::{BounceError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Where and how big a marker currently is on the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerGeometry {
    /// Resting screen position of the icon (and shadow) element
    pub position: PixelPoint,
    pub icon_size: Size,
    /// `None` for markers drawn without a shadow
    pub shadow_size: Option<Size>,
    /// Added to the resting y to form the stacking order
    pub z_index_offset: i32,
}

impl MarkerGeometry {
    pub fn new(position: PixelPoint, icon_size: Size) -> Self {
        Self {
            position,
            icon_size,
            shadow_size: None,
            z_index_offset: 0,
        }
    }

    pub fn with_shadow(mut self, shadow_size: Size) -> Self {
        self.shadow_size = Some(shadow_size);
        self
    }

    pub fn with_z_index_offset(mut self, offset: i32) -> Self {
        self.z_index_offset = offset;
        self
    }

    /// Stacking order at rest. Kept for every frame so bouncing never
    /// reorders markers.
    pub fn z_index(&self) -> i32 {
        self.position.y + self.z_index_offset
    }

    pub fn validate(&self) -> Result<()> {
        if self.icon_size.is_empty() {
            return Err(BounceError::InvalidOption(format!(
                "icon size must be non-zero, got {}x{}",
                self.icon_size.width, self.icon_size.height
            )));
        }
        if let Some(shadow) = self.shadow_size.filter(|s| s.is_empty()) {
            return Err(BounceError::InvalidOption(format!(
                "shadow size must be non-zero, got {}x{}",
                shadow.width, shadow.height
            )));
        }
        Ok(())
    }
}

/// A single visual state for an icon or shadow element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualState {
    /// Hardware path: full transform of the element
    Transform(TransformDescriptor),
    /// Fallback path: raw `left`/`top` pixel position
    Position(PixelPoint),
}

impl VisualState {
    /// Style declarations for this state, appended to the element's
    /// baseline style
    pub fn style(&self, baseline: &str) -> String {
        match self {
            VisualState::Transform(t) => format!("{baseline}transform: {};", t.to_css()),
            VisualState::Position(p) => format!("{baseline}left: {}px; top: {}px;", p.x, p.y),
        }
    }
}

/// Everything applied to one marker for one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub icon: VisualState,
    pub shadow: Option<VisualState>,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledMotion {
    /// Transform-capable surfaces get both phases
    Transforms {
        icon_move: Vec<TransformDescriptor>,
        shadow_move: Option<Vec<TransformDescriptor>>,
        icon_resize: Vec<TransformDescriptor>,
        shadow_resize: Option<Vec<TransformDescriptor>>,
        z_index: i32,
    },
    /// Without transforms only the move phase can be expressed
    Points {
        icon_move: Vec<PixelPoint>,
        shadow_move: Option<Vec<PixelPoint>>,
        z_index: i32,
    },
}

impl CompiledMotion {
    pub fn compile(
        geometry: &MarkerGeometry,
        config: &AnimationConfig,
        transforms: bool,
    ) -> Result<Self> {
        geometry.validate()?;
        let origin = geometry.position;
        let z_index = geometry.z_index();

        if !transforms {
            let shadow_move = match geometry.shadow_size {
                Some(_) => Some(shadow_move_points(origin, config)?),
                None => None,
            };
            return Ok(CompiledMotion::Points {
                icon_move: icon_move_points(origin, config.bounce_height),
                shadow_move,
                z_index,
            });
        }

        let (shadow_move, shadow_resize) = match geometry.shadow_size {
            Some(shadow) => (
                Some(
                    shadow_move_points(origin, config)?
                        .into_iter()
                        .map(TransformDescriptor::translate)
                        .collect(),
                ),
                Some(shadow_resize_transforms(origin, shadow, config)?),
            ),
            None => (None, None),
        };

        Ok(CompiledMotion::Transforms {
            icon_move: icon_move_points(origin, config.bounce_height)
                .into_iter()
                .map(TransformDescriptor::translate)
                .collect(),
            shadow_move,
            icon_resize: icon_resize_transforms(
                origin,
                geometry.icon_size.height,
                config.contract_height,
            ),
            shadow_resize,
            z_index,
        })
    }

    pub fn supports_resize(&self) -> bool {
        matches!(self, CompiledMotion::Transforms { .. })
    }

    /// Number of distinct states available for `phase`
    pub fn state_count(&self, phase: Phase) -> usize {
        match (self, phase) {
            (CompiledMotion::Transforms { icon_move, .. }, Phase::Move) => icon_move.len(),
            (CompiledMotion::Transforms { icon_resize, .. }, Phase::Resize) => icon_resize.len(),
            (CompiledMotion::Points { icon_move, .. }, Phase::Move) => icon_move.len(),
            (CompiledMotion::Points { .. }, Phase::Resize) => 0,
        }
    }

    /// The frame for `step` of `phase`, if this motion has one
    pub fn frame(&self, phase: Phase, step: u32) -> Option<Frame> {
        let step = step as usize;
        match self {
            CompiledMotion::Transforms {
                icon_move,
                shadow_move,
                icon_resize,
                shadow_resize,
                z_index,
            } => {
                let (icon, shadow) = match phase {
                    Phase::Move => (icon_move, shadow_move),
                    Phase::Resize => (icon_resize, shadow_resize),
                };
                Some(Frame {
                    icon: VisualState::Transform(*icon.get(step)?),
                    shadow: shadow
                        .as_ref()
                        .and_then(|s| s.get(step))
                        .map(|t| VisualState::Transform(*t)),
                    z_index: *z_index,
                })
            }
            CompiledMotion::Points {
                icon_move,
                shadow_move,
                z_index,
            } => {
                if phase == Phase::Resize {
                    return None;
                }
                Some(Frame {
                    icon: VisualState::Position(*icon_move.get(step)?),
                    shadow: shadow_move
                        .as_ref()
                        .and_then(|s| s.get(step))
                        .map(|p| VisualState::Position(*p)),
                    z_index: *z_index,
                })
            }
        }
    }
}

/// Icon positions for offsets `0..=height`, straight up from `origin`
fn icon_move_points(origin: PixelPoint, height: u32) -> Vec<PixelPoint> {
    (0..=height as i32).map(|offset| origin.offset(0, -offset)).collect()
}

/// Shadow positions for offsets `0..=height`, along the shadow angle
fn shadow_move_points(origin: PixelPoint, config: &AnimationConfig) -> Result<Vec<PixelPoint>> {
    rasterize_segment(origin, config.shadow_angle, config.bounce_height + 1)
}

/// Squash the icon by `offset` pixels while its bottom edge stays put
fn icon_resize_transforms(
    origin: PixelPoint,
    icon_height: u32,
    contract_height: u32,
) -> Vec<TransformDescriptor> {
    let height = icon_height as f64;
    (0..=contract_height as i32)
        .map(|offset| {
            let factor = ((height - offset as f64) / height).max(0.0);
            TransformDescriptor::scale_y(origin.offset(0, offset), factor)
        })
        .collect()
}

/// Shrink the shadow along its projection as the icon squashes.
///
/// The reversed shadow ray gives, per offset, how far the shadow's far edge
/// retreats on each axis. The element is scaled down by that much and shifted
/// so the edge nearest the icon does not move.
fn shadow_resize_transforms(
    origin: PixelPoint,
    shadow: Size,
    config: &AnimationConfig,
) -> Result<Vec<TransformDescriptor>> {
    let (width, height) = (shadow.width as f64, shadow.height as f64);
    let points = rasterize_segment(origin, config.shadow_angle + PI, config.contract_height + 1)?;

    Ok(points
        .into_iter()
        .map(|p| {
            let (rdx, rdy) = (p.x - origin.x, p.y - origin.y);
            let scale_x = ((width - rdx.abs() as f64) / width).max(0.0);
            let scale_y = ((height - rdy.abs() as f64) / height).max(0.0);
            TransformDescriptor::scale(origin.offset(rdx.max(0), rdy.max(0)), scale_x, scale_y)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    fn geometry() -> MarkerGeometry {
        MarkerGeometry::new(PixelPoint::new(100, 200), Size::new(25, 41))
            .with_shadow(Size::new(41, 41))
    }

    #[test]
    fn test_transform_motion_state_counts() {
        let config = AnimationConfig::default();
        let motion = CompiledMotion::compile(&geometry(), &config, true).unwrap();

        assert!(motion.supports_resize());
        assert_eq!(motion.state_count(Phase::Move), 16);
        assert_eq!(motion.state_count(Phase::Resize), 13);
        if let CompiledMotion::Transforms {
            shadow_move,
            shadow_resize,
            ..
        } = &motion
        {
            assert_eq!(shadow_move.as_ref().unwrap().len(), 16);
            assert_eq!(shadow_resize.as_ref().unwrap().len(), 13);
        }
    }

    #[test]
    fn test_icon_moves_straight_up() {
        let motion =
            CompiledMotion::compile(&geometry(), &AnimationConfig::default(), true).unwrap();

        for step in 0..=15 {
            let frame = motion.frame(Phase::Move, step).unwrap();
            match frame.icon {
                VisualState::Transform(t) => {
                    assert_eq!(t.translation(), Point::new(100.0, 200.0 - step as f64));
                    assert_eq!(t.scale_factors(), (1.0, 1.0));
                }
                other => panic!("unexpected state {other:?}"),
            }
        }
        assert!(motion.frame(Phase::Move, 16).is_none());
    }

    #[test]
    fn test_shadow_moves_along_angle() {
        let motion =
            CompiledMotion::compile(&geometry(), &AnimationConfig::default(), true).unwrap();

        let at_rest = motion.frame(Phase::Move, 0).unwrap().shadow.unwrap();
        let at_apex = motion.frame(Phase::Move, 15).unwrap().shadow.unwrap();
        assert_eq!(
            at_rest,
            VisualState::Transform(TransformDescriptor::translate(PixelPoint::new(100, 200)))
        );
        // default angle casts the shadow up and to the right
        assert_eq!(
            at_apex,
            VisualState::Transform(TransformDescriptor::translate(PixelPoint::new(115, 185)))
        );
    }

    #[test]
    fn test_icon_resize_keeps_bottom_edge() {
        let geometry = geometry();
        let motion =
            CompiledMotion::compile(&geometry, &AnimationConfig::default(), true).unwrap();
        let bottom = Point::new(0.0, geometry.icon_size.height as f64);

        for step in 0..=12 {
            let frame = motion.frame(Phase::Resize, step).unwrap();
            let VisualState::Transform(t) = frame.icon else {
                panic!("resize must use transforms");
            };
            let (_, scale_y) = t.scale_factors();
            assert_eq!(scale_y, (41.0 - step as f64) / 41.0);
            let anchored = t.apply(bottom);
            assert!((anchored.y - 241.0).abs() < 1e-9);
            assert_eq!(anchored.x, 100.0);
        }
    }

    #[test]
    fn test_shadow_resize_shrinks_towards_icon() {
        let geometry = geometry();
        let motion =
            CompiledMotion::compile(&geometry, &AnimationConfig::default(), true).unwrap();

        let rest = motion.frame(Phase::Resize, 0).unwrap().shadow.unwrap();
        assert_eq!(
            rest,
            VisualState::Transform(TransformDescriptor::scale(PixelPoint::new(100, 200), 1.0, 1.0))
        );

        let VisualState::Transform(t) = motion.frame(Phase::Resize, 12).unwrap().shadow.unwrap()
        else {
            panic!("resize must use transforms");
        };
        let (scale_x, scale_y) = t.scale_factors();
        assert!(scale_x < 1.0 && scale_y < 1.0);
        // bottom-left corner, nearest the icon foot, stays where it was
        let corner = t.apply(Point::new(0.0, 41.0));
        assert!((corner.x - 100.0).abs() < 1e-9);
        assert!((corner.y - 241.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_motion_uses_points_and_skips_resize() {
        let config = AnimationConfig::default();
        let motion = CompiledMotion::compile(&geometry(), &config, false).unwrap();

        assert!(!motion.supports_resize());
        assert_eq!(motion.state_count(Phase::Move), 16);
        assert_eq!(motion.state_count(Phase::Resize), 0);
        assert!(motion.frame(Phase::Resize, 1).is_none());

        let frame = motion.frame(Phase::Move, 15).unwrap();
        assert_eq!(frame.icon, VisualState::Position(PixelPoint::new(100, 185)));
        assert_eq!(frame.shadow, Some(VisualState::Position(PixelPoint::new(115, 185))));
    }

    #[test]
    fn test_marker_without_shadow() {
        let geometry = MarkerGeometry::new(PixelPoint::new(0, 0), Size::new(25, 41));
        let motion =
            CompiledMotion::compile(&geometry, &AnimationConfig::default(), true).unwrap();
        assert!(motion.frame(Phase::Move, 3).unwrap().shadow.is_none());
        assert!(motion.frame(Phase::Resize, 3).unwrap().shadow.is_none());
    }

    #[test]
    fn test_frames_keep_resting_z_index() {
        let geometry = geometry().with_z_index_offset(1000);
        let motion =
            CompiledMotion::compile(&geometry, &AnimationConfig::default(), true).unwrap();
        assert_eq!(motion.frame(Phase::Move, 15).unwrap().z_index, 1200);
        assert_eq!(motion.frame(Phase::Resize, 5).unwrap().z_index, 1200);
    }

    #[test]
    fn test_empty_icon_is_rejected() {
        let geometry = MarkerGeometry::new(PixelPoint::new(0, 0), Size::new(25, 0));
        assert!(matches!(
            CompiledMotion::compile(&geometry, &AnimationConfig::default(), true),
            Err(BounceError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_visual_state_style() {
        let state = VisualState::Position(PixelPoint::new(4, -2));
        assert_eq!(state.style("opacity: 1; "), "opacity: 1; left: 4px; top: -2px;");
    }
}
