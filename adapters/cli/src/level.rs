//! Level files and the placement rules the headless host enforces.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use lane_defence_core::{
    DefenderKind, DefenderView, LevelConfig, PlacementValidator, TargetingStrategy, Vec2,
};
use serde::Deserialize;

const DEFAULT_PATH_CLEARANCE: f32 = 24.0;
const DEFAULT_DEFENDER_SPACING: f32 = 20.0;

#[derive(Debug, Deserialize)]
struct LevelFile {
    level: LevelConfig,
    #[serde(default)]
    placement: PlacementRules,
    #[serde(default)]
    defenders: Vec<DefenderEntry>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct PlacementRules {
    #[serde(default = "default_clearance")]
    path_clearance: f32,
    #[serde(default = "default_spacing")]
    defender_spacing: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            path_clearance: DEFAULT_PATH_CLEARANCE,
            defender_spacing: DEFAULT_DEFENDER_SPACING,
        }
    }
}

fn default_clearance() -> f32 {
    DEFAULT_PATH_CLEARANCE
}

fn default_spacing() -> f32 {
    DEFAULT_DEFENDER_SPACING
}

#[derive(Debug, Deserialize)]
struct DefenderEntry {
    kind: String,
    position: [f32; 2],
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    upgrades: u8,
}

/// Defender the level asks the host to build before the first wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlannedDefender {
    pub(crate) kind: DefenderKind,
    pub(crate) position: Vec2,
    pub(crate) strategy: Option<TargetingStrategy>,
    pub(crate) upgrades: u8,
}

/// Fully parsed level file.
#[derive(Debug)]
pub(crate) struct LevelPlan {
    pub(crate) config: LevelConfig,
    pub(crate) validator: PathClearance,
    pub(crate) defenders: Vec<PlannedDefender>,
}

impl LevelPlan {
    /// Reads and parses the level file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load level from {}", path.display()))
    }

    /// Parses level TOML. Unknown kinds and strategies are fatal.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let file: LevelFile =
            toml::from_str(contents).context("failed to parse level toml contents")?;
        let level = file.level.validate().context("level is invalid")?;

        let rules = file.placement;
        ensure!(
            rules.path_clearance.is_finite() && rules.path_clearance >= 0.0,
            "path clearance must be finite and non-negative"
        );
        ensure!(
            rules.defender_spacing.is_finite() && rules.defender_spacing >= 0.0,
            "defender spacing must be finite and non-negative"
        );

        let mut defenders = Vec::with_capacity(file.defenders.len());
        for (index, entry) in file.defenders.into_iter().enumerate() {
            let kind = entry
                .kind
                .parse::<DefenderKind>()
                .with_context(|| format!("defender #{index} has an invalid kind"))?;
            let strategy = entry
                .strategy
                .as_deref()
                .map(str::parse::<TargetingStrategy>)
                .transpose()
                .with_context(|| format!("defender #{index} has an invalid strategy"))?;
            defenders.push(PlannedDefender {
                kind,
                position: Vec2::from(entry.position),
                strategy,
                upgrades: entry.upgrades,
            });
        }

        Ok(Self {
            validator: PathClearance::new(&level.waypoints, rules),
            config: file.level,
            defenders,
        })
    }
}

/// Keeps defenders off the path and away from each other.
#[derive(Clone, Debug)]
pub(crate) struct PathClearance {
    segments: Vec<(Vec2, Vec2)>,
    clearance: f32,
    spacing: f32,
}

impl PathClearance {
    fn new(waypoints: &[Vec2], rules: PlacementRules) -> Self {
        Self {
            segments: waypoints
                .windows(2)
                .map(|pair| (pair[0], pair[1]))
                .collect(),
            clearance: rules.path_clearance,
            spacing: rules.defender_spacing,
        }
    }
}

impl PlacementValidator for PathClearance {
    fn is_valid(&self, _kind: DefenderKind, position: Vec2, defenders: &DefenderView) -> bool {
        let clear_of_path = self
            .segments
            .iter()
            .all(|&(start, end)| distance_to_segment(position, start, end) >= self.clearance);
        let clear_of_defenders = defenders
            .iter()
            .all(|defender| defender.position.distance(position) >= self.spacing);
        clear_of_path && clear_of_defenders
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let span = end - start;
    let length_squared = span.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(span) / length_squared).clamp(0.0, 1.0);
    point.distance(start + span * t)
}
