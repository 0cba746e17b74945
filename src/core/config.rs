//! Configuration for marker bouncing
//!
//! `AnimationConfig` is the complete, validated set of parameters a marker
//! bounces with. `BounceOptions` is the partial form callers hand in: every
//! field is optional and gets merged over an existing config, so only the
//! values a caller cares about have to be spelled out.

use crate::core::constants::{
    DEFAULT_BOUNCE_HEIGHT, DEFAULT_BOUNCE_SPEED, DEFAULT_CONTRACT_HEIGHT, DEFAULT_CONTRACT_SPEED,
    DEFAULT_SHADOW_ANGLE, MAX_EXTENT, MAX_SPEED,
};
use crate::{BounceError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    /// Height of the jump in pixels
    pub bounce_height: u32,
    /// Height of the landing contraction in pixels
    pub contract_height: u32,
    /// Pacing of the jump in milliseconds
    pub bounce_speed: u64,
    /// Pacing of the contraction in milliseconds
    pub contract_speed: u64,
    /// Angle the shadow is projected at, in radians
    pub shadow_angle: f64,
    /// Squash the icon after every landing. Only honoured on surfaces with
    /// transform support; elsewhere markers pause between jumps instead.
    pub elastic: bool,
    /// Only one exclusive marker may bounce at a time
    pub exclusive: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            bounce_height: DEFAULT_BOUNCE_HEIGHT,
            contract_height: DEFAULT_CONTRACT_HEIGHT,
            bounce_speed: DEFAULT_BOUNCE_SPEED,
            contract_speed: DEFAULT_CONTRACT_SPEED,
            shadow_angle: DEFAULT_SHADOW_ANGLE,
            elastic: true,
            exclusive: false,
        }
    }
}

impl AnimationConfig {
    /// Returns a copy of `self` with `options` applied on top.
    ///
    /// Every supplied value is validated before anything is merged, so a
    /// rejected call leaves the caller's config untouched.
    pub fn merged(&self, options: &BounceOptions) -> Result<AnimationConfig> {
        let mut config = *self;

        if let Some(height) = options.bounce_height {
            config.bounce_height = extent("bounceHeight", height)?;
        }
        if let Some(height) = options.contract_height {
            config.contract_height = extent("contractHeight", height)?;
        }
        if let Some(speed) = options.bounce_speed {
            config.bounce_speed = speed_ms("bounceSpeed", speed)?;
        }
        if let Some(speed) = options.contract_speed {
            config.contract_speed = speed_ms("contractSpeed", speed)?;
        }
        if let Some(angle) = options.shadow_angle {
            if !angle.is_finite() {
                return Err(BounceError::InvalidOption(format!(
                    "shadowAngle must be finite, got {angle}"
                )));
            }
            config.shadow_angle = angle;
        }
        if let Some(elastic) = options.elastic {
            config.elastic = elastic;
        }
        if let Some(exclusive) = options.exclusive {
            config.exclusive = exclusive;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants a complete config must hold
    pub fn validate(&self) -> Result<()> {
        extent("bounceHeight", self.bounce_height as i64)?;
        extent("contractHeight", self.contract_height as i64)?;
        speed_ms("bounceSpeed", self.bounce_speed as i64)?;
        speed_ms("contractSpeed", self.contract_speed as i64)?;
        if !self.shadow_angle.is_finite() {
            return Err(BounceError::InvalidOption(format!(
                "shadowAngle must be finite, got {}",
                self.shadow_angle
            )));
        }
        Ok(())
    }
}

fn extent(option: &'static str, value: i64) -> Result<u32> {
    if value <= 0 || value > MAX_EXTENT as i64 {
        return Err(BounceError::InvalidExtent { option, value });
    }
    Ok(value as u32)
}

fn speed_ms(option: &'static str, value: i64) -> Result<u64> {
    if value <= 0 || value > MAX_SPEED as i64 {
        return Err(BounceError::InvalidSpeed { option, value });
    }
    Ok(value as u64)
}

/// Partial bounce configuration. Unset fields keep their current value.
///
/// Numeric fields are signed so that negative input coming from JSON is
/// reported as an invalid extent or speed instead of a parse failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BounceOptions {
    pub bounce_height: Option<i64>,
    pub contract_height: Option<i64>,
    pub bounce_speed: Option<i64>,
    pub contract_speed: Option<i64>,
    pub shadow_angle: Option<f64>,
    /// Ignored by surfaces without transform support, see
    /// [`AnimationConfig::elastic`]
    pub elastic: Option<bool>,
    pub exclusive: Option<bool>,
}

impl BounceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn bounce_height(mut self, px: i64) -> Self {
        self.bounce_height = Some(px);
        self
    }

    pub fn contract_height(mut self, px: i64) -> Self {
        self.contract_height = Some(px);
        self
    }

    pub fn bounce_speed(mut self, ms: i64) -> Self {
        self.bounce_speed = Some(ms);
        self
    }

    pub fn contract_speed(mut self, ms: i64) -> Self {
        self.contract_speed = Some(ms);
        self
    }

    pub fn shadow_angle(mut self, radians: f64) -> Self {
        self.shadow_angle = Some(radians);
        self
    }

    pub fn elastic(mut self, elastic: bool) -> Self {
        self.elastic = Some(elastic);
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = Some(exclusive);
        self
    }
}

impl From<AnimationConfig> for BounceOptions {
    fn from(config: AnimationConfig) -> Self {
        Self {
            bounce_height: Some(config.bounce_height as i64),
            contract_height: Some(config.contract_height as i64),
            bounce_speed: Some(config.bounce_speed as i64),
            contract_speed: Some(config.contract_speed as i64),
            shadow_angle: Some(config.shadow_angle),
            elastic: Some(config.elastic),
            exclusive: Some(config.exclusive),
        }
    }
}
