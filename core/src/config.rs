//! Level configuration and the fatal errors raised while validating it.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PLAYFIELD_MARGIN: f32 = 64.0;

/// Errors that abort initialization.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The path needs at least two waypoints.
    #[error("path needs at least two waypoints, got {waypoints}")]
    DegeneratePath {
        /// Number of waypoints that were supplied.
        waypoints: usize,
    },
    /// Every waypoint sits on the same spot.
    #[error("path has zero total length")]
    ZeroLengthPath,
    /// A waypoint contained a NaN or infinite coordinate.
    #[error("waypoint {index} is not finite")]
    NonFiniteWaypoint {
        /// Position of the waypoint in the sequence.
        index: usize,
    },
    /// The playfield bounds are inverted or empty.
    #[error("playfield bounds are empty or inverted")]
    InvalidPlayfield,
    /// The level schedules no waves.
    #[error("level must schedule at least one wave")]
    NoWaves,
    /// The level starts without lives.
    #[error("level must start with at least one life")]
    NoLives,
    /// An attacker identifier did not match any kind.
    #[error("unknown attacker kind '{0}'")]
    UnknownAttackerKind(String),
    /// A defender identifier did not match any kind.
    #[error("unknown defender kind '{0}'")]
    UnknownDefenderKind(String),
    /// A targeting strategy identifier did not match any strategy.
    #[error("unknown targeting strategy '{0}'")]
    UnknownStrategy(String),
    /// A persisted defender level is outside the valid range.
    #[error("defender level {0} is out of range")]
    InvalidLevel(u8),
}

/// Axis-aligned playfield bounds expressed in config form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayfieldConfig {
    /// Lower-left corner.
    pub min: [f32; 2],
    /// Upper-right corner.
    pub max: [f32; 2],
}

/// Static description of a level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Ordered path waypoints.
    pub waypoints: Vec<[f32; 2]>,
    /// Bounds projectiles may not leave; derived from the path when absent.
    #[serde(default)]
    pub playfield: Option<PlayfieldConfig>,
    /// Gold available at the start of the match.
    pub starting_gold: u64,
    /// Lives available at the start of the match.
    pub starting_lives: u32,
    /// Number of waves in the level.
    pub total_waves: u32,
}

/// Level configuration that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedLevel {
    /// Ordered path waypoints.
    pub waypoints: Vec<Vec2>,
    /// Bounds projectiles may not leave.
    pub playfield: Playfield,
    /// Gold available at the start of the match.
    pub starting_gold: u64,
    /// Lives available at the start of the match.
    pub starting_lives: u32,
    /// Number of waves in the level.
    pub total_waves: u32,
}

impl LevelConfig {
    /// Checks the configuration and converts it into engine types.
    pub fn validate(&self) -> Result<ValidatedLevel, ConfigError> {
        if self.waypoints.len() < 2 {
            return Err(ConfigError::DegeneratePath {
                waypoints: self.waypoints.len(),
            });
        }

        let mut waypoints = Vec::with_capacity(self.waypoints.len());
        for (index, [x, y]) in self.waypoints.iter().copied().enumerate() {
            let point = Vec2::new(x, y);
            if !point.is_finite() {
                return Err(ConfigError::NonFiniteWaypoint { index });
            }
            waypoints.push(point);
        }

        let length: f32 = waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        if length <= 0.0 {
            return Err(ConfigError::ZeroLengthPath);
        }

        if self.total_waves == 0 {
            return Err(ConfigError::NoWaves);
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }

        let playfield = match self.playfield {
            Some(bounds) => Playfield::new(Vec2::from(bounds.min), Vec2::from(bounds.max))?,
            None => Playfield::around(&waypoints, PLAYFIELD_MARGIN),
        };

        Ok(ValidatedLevel {
            waypoints,
            playfield,
            starting_gold: self.starting_gold,
            starting_lives: self.starting_lives,
            total_waves: self.total_waves,
        })
    }
}

/// Axis-aligned bounds of the playfield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    min: Vec2,
    max: Vec2,
}

impl Playfield {
    /// Creates bounds from two corners.
    pub fn new(min: Vec2, max: Vec2) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min.x >= max.x || min.y >= max.y {
            return Err(ConfigError::InvalidPlayfield);
        }
        Ok(Self { min, max })
    }

    /// Bounding box of `points` grown by `margin` on every side.
    #[must_use]
    pub fn around(points: &[Vec2], margin: f32) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        Self {
            min: min - Vec2::splat(margin),
            max: max + Vec2::splat(margin),
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether `point` lies inside the bounds (edges included).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(waypoints: Vec<[f32; 2]>) -> LevelConfig {
        LevelConfig {
            waypoints,
            playfield: None,
            starting_gold: 100,
            starting_lives: 20,
            total_waves: 10,
        }
    }

    #[test]
    fn single_waypoint_is_degenerate() {
        assert_eq!(
            level(vec![[0.0, 0.0]]).validate(),
            Err(ConfigError::DegeneratePath { waypoints: 1 })
        );
    }

    #[test]
    fn coincident_waypoints_have_no_length() {
        assert_eq!(
            level(vec![[3.0, 3.0], [3.0, 3.0]]).validate(),
            Err(ConfigError::ZeroLengthPath)
        );
    }

    #[test]
    fn playfield_defaults_to_padded_path_bounds() {
        let validated = level(vec![[0.0, 0.0], [100.0, 0.0], [100.0, 50.0]])
            .validate()
            .expect("valid level");
        assert_eq!(validated.playfield.min(), Vec2::new(-64.0, -64.0));
        assert_eq!(validated.playfield.max(), Vec2::new(164.0, 114.0));
        assert!(validated.playfield.contains(Vec2::new(164.0, 0.0)));
        assert!(!validated.playfield.contains(Vec2::new(165.0, 0.0)));
    }

    #[test]
    fn inverted_playfield_is_rejected() {
        let mut config = level(vec![[0.0, 0.0], [10.0, 0.0]]);
        config.playfield = Some(PlayfieldConfig {
            min: [10.0, 10.0],
            max: [0.0, 20.0],
        });
        assert_eq!(config.validate(), Err(ConfigError::InvalidPlayfield));
    }

    #[test]
    fn level_requires_waves_and_lives() {
        let mut config = level(vec![[0.0, 0.0], [10.0, 0.0]]);
        config.total_waves = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoWaves));

        config.total_waves = 1;
        config.starting_lives = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoLives));
    }
}
