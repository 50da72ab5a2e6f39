//! Stat tables for attacker and defender kinds.

use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, SpecialEffect, TargetingStrategy, WaveId};

/// Highest level a defender can reach.
pub const MAX_LEVEL: u8 = 4;

/// Percentage of the cumulative spend refunded when a defender is sold.
pub const SELL_REFUND_PERCENT: u64 = 70;

/// Damage bonus granted per level of a support defender whose aura covers a shooter.
pub const AURA_DAMAGE_PER_LEVEL: f32 = 0.1;

/// Every wave whose index is a multiple of this value is a boss wave.
pub const BOSS_WAVE_INTERVAL: u32 = 5;

/// Upper bound applied to magic resist when damage is mitigated.
pub const RESIST_CAP: f32 = 0.8;

const ARMOR_WAVE_STEP: u32 = 5;
const RESIST_PER_WAVE: f32 = 0.01;
const HP_GROWTH_PER_WAVE: f32 = 0.12;

/// Kinds of attackers that travel the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackerKind {
    /// Baseline infantry.
    Grunt,
    /// Fast and fragile.
    Runner,
    /// Slow and armored.
    Brute,
    /// Resists magic damage.
    Wraith,
    /// Boss unit released on boss waves.
    Overlord,
}

/// Stats an attacker spawns with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackerStats {
    /// Maximum health.
    pub max_hp: f32,
    /// Flat reduction applied to physical damage.
    pub armor: f32,
    /// Fraction of magic damage ignored before the resist cap is applied.
    pub resist: f32,
    /// Path speed in world units per second.
    pub speed: f32,
    /// Gold credited when the attacker is killed.
    pub reward: u64,
    /// Lives lost when the attacker reaches the end of the path.
    pub lives_cost: u32,
}

impl AttackerKind {
    /// Every attacker kind in declaration order.
    pub const ALL: [AttackerKind; 5] = [
        Self::Grunt,
        Self::Runner,
        Self::Brute,
        Self::Wraith,
        Self::Overlord,
    ];

    /// Stats of the kind before wave scaling.
    #[must_use]
    pub const fn base_stats(self) -> AttackerStats {
        match self {
            Self::Grunt => AttackerStats {
                max_hp: 50.0,
                armor: 0.0,
                resist: 0.0,
                speed: 60.0,
                reward: 5,
                lives_cost: 1,
            },
            Self::Runner => AttackerStats {
                max_hp: 30.0,
                armor: 0.0,
                resist: 0.1,
                speed: 110.0,
                reward: 4,
                lives_cost: 1,
            },
            Self::Brute => AttackerStats {
                max_hp: 160.0,
                armor: 4.0,
                resist: 0.0,
                speed: 40.0,
                reward: 12,
                lives_cost: 2,
            },
            Self::Wraith => AttackerStats {
                max_hp: 80.0,
                armor: 0.0,
                resist: 0.5,
                speed: 70.0,
                reward: 10,
                lives_cost: 1,
            },
            Self::Overlord => AttackerStats {
                max_hp: 900.0,
                armor: 6.0,
                resist: 0.3,
                speed: 30.0,
                reward: 100,
                lives_cost: 10,
            },
        }
    }

    /// Stats of the kind scaled for the provided wave.
    ///
    /// Health, armor and resist scale through three independent functions:
    /// [`hp_multiplier_for_wave`], [`armor_bonus_for_wave`] and
    /// [`resist_bonus_for_wave`].
    #[must_use]
    pub fn stats_for_wave(self, wave: WaveId) -> AttackerStats {
        let base = self.base_stats();
        AttackerStats {
            max_hp: base.max_hp * hp_multiplier_for_wave(wave),
            armor: base.armor + armor_bonus_for_wave(wave),
            resist: base.resist + resist_bonus_for_wave(wave),
            ..base
        }
    }

    /// Lowercase identifier used by configuration files.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Grunt => "grunt",
            Self::Runner => "runner",
            Self::Brute => "brute",
            Self::Wraith => "wraith",
            Self::Overlord => "overlord",
        }
    }
}

impl FromStr for AttackerKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == normalized)
            .ok_or_else(|| ConfigError::UnknownAttackerKind(value.to_owned()))
    }
}

/// Health multiplier applied to attackers of the provided wave.
#[must_use]
pub fn hp_multiplier_for_wave(wave: WaveId) -> f32 {
    1.0 + HP_GROWTH_PER_WAVE * wave.get().saturating_sub(1) as f32
}

/// Flat armor bonus: one point for every completed block of five waves.
///
/// Independent of [`resist_bonus_for_wave`]; the two are never merged.
#[must_use]
pub fn armor_bonus_for_wave(wave: WaveId) -> f32 {
    (wave.get() / ARMOR_WAVE_STEP) as f32
}

/// Incremental resist creep of one percent per wave after the first.
///
/// The resulting resist is only clamped to [`RESIST_CAP`] at mitigation time.
#[must_use]
pub fn resist_bonus_for_wave(wave: WaveId) -> f32 {
    RESIST_PER_WAVE * wave.get().saturating_sub(1) as f32
}

/// Kinds of stationary defenders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenderKind {
    /// Fast single-target shooter.
    Arrow,
    /// Slow shooter dealing area damage.
    Cannon,
    /// Slows its targets.
    Frost,
    /// Lightning that chains between attackers.
    Tesla,
    /// Poisons its targets.
    Venom,
    /// Short-ranged stunning strikes.
    Hammer,
    /// Support unit that boosts nearby defenders instead of firing.
    Banner,
}

/// Fixed constants describing a defender kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderProfile {
    /// Gold required to build the defender.
    pub cost: u64,
    /// Damage dealt per projectile at level one.
    pub damage: f32,
    /// Detection radius at level one; aura radius for support kinds.
    pub range: f32,
    /// Shots per second at level one.
    pub fire_rate: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Damage growth per level above one.
    pub damage_growth: f32,
    /// Range growth per level above one.
    pub range_growth: f32,
    /// Fire-rate growth per level above one.
    pub fire_rate_growth: f32,
    /// Upgrade cost multiplied by the current level.
    pub upgrade_cost_step: u64,
    /// Strategy a freshly built defender uses.
    pub strategy: TargetingStrategy,
}

/// Stats derived from a defender's kind and level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderStats {
    /// Damage per projectile.
    pub damage: f32,
    /// Detection radius.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
}

impl DefenderKind {
    /// Every defender kind in declaration order.
    pub const ALL: [DefenderKind; 7] = [
        Self::Arrow,
        Self::Cannon,
        Self::Frost,
        Self::Tesla,
        Self::Venom,
        Self::Hammer,
        Self::Banner,
    ];

    /// Fixed constants describing the kind.
    #[must_use]
    pub const fn profile(self) -> DefenderProfile {
        match self {
            Self::Arrow => DefenderProfile {
                cost: 50,
                damage: 15.0,
                range: 140.0,
                fire_rate: 1.5,
                projectile_speed: 420.0,
                damage_growth: 0.5,
                range_growth: 0.1,
                fire_rate_growth: 0.1,
                upgrade_cost_step: 40,
                strategy: TargetingStrategy::First,
            },
            Self::Cannon => DefenderProfile {
                cost: 90,
                damage: 30.0,
                range: 120.0,
                fire_rate: 0.6,
                projectile_speed: 260.0,
                damage_growth: 0.4,
                range_growth: 0.08,
                fire_rate_growth: 0.05,
                upgrade_cost_step: 70,
                strategy: TargetingStrategy::First,
            },
            Self::Frost => DefenderProfile {
                cost: 70,
                damage: 6.0,
                range: 130.0,
                fire_rate: 1.0,
                projectile_speed: 360.0,
                damage_growth: 0.3,
                range_growth: 0.1,
                fire_rate_growth: 0.1,
                upgrade_cost_step: 50,
                strategy: TargetingStrategy::First,
            },
            Self::Tesla => DefenderProfile {
                cost: 120,
                damage: 20.0,
                range: 150.0,
                fire_rate: 0.8,
                projectile_speed: 600.0,
                damage_growth: 0.35,
                range_growth: 0.1,
                fire_rate_growth: 0.1,
                upgrade_cost_step: 90,
                strategy: TargetingStrategy::Nearest,
            },
            Self::Venom => DefenderProfile {
                cost: 80,
                damage: 5.0,
                range: 130.0,
                fire_rate: 1.0,
                projectile_speed: 380.0,
                damage_growth: 0.3,
                range_growth: 0.1,
                fire_rate_growth: 0.1,
                upgrade_cost_step: 60,
                strategy: TargetingStrategy::Strongest,
            },
            Self::Hammer => DefenderProfile {
                cost: 100,
                damage: 25.0,
                range: 90.0,
                fire_rate: 0.5,
                projectile_speed: 300.0,
                damage_growth: 0.4,
                range_growth: 0.05,
                fire_rate_growth: 0.1,
                upgrade_cost_step: 80,
                strategy: TargetingStrategy::Nearest,
            },
            Self::Banner => DefenderProfile {
                cost: 110,
                damage: 0.0,
                range: 120.0,
                fire_rate: 0.0,
                projectile_speed: 0.0,
                damage_growth: 0.0,
                range_growth: 0.15,
                fire_rate_growth: 0.0,
                upgrade_cost_step: 90,
                strategy: TargetingStrategy::First,
            },
        }
    }

    /// Reports whether the kind projects an aura instead of firing.
    #[must_use]
    pub const fn is_support(self) -> bool {
        matches!(self, Self::Banner)
    }

    /// Stats at the provided level.
    ///
    /// Every stat grows linearly on its base value:
    /// `base × (1 + growth × (level − 1))`.
    ///
    /// # Panics
    ///
    /// Panics when `level` lies outside `1..=MAX_LEVEL`.
    #[must_use]
    pub fn stats_at(self, level: u8) -> DefenderStats {
        let profile = self.profile();
        DefenderStats {
            damage: profile.damage * level_factor(profile.damage_growth, level),
            range: profile.range * level_factor(profile.range_growth, level),
            fire_rate: profile.fire_rate * level_factor(profile.fire_rate_growth, level),
        }
    }

    /// Gold required to advance from `level` to the next level.
    #[must_use]
    pub const fn upgrade_cost(self, level: u8) -> u64 {
        self.profile().upgrade_cost_step * level as u64
    }

    /// Cumulative gold spent to build the kind and upgrade it to `level`.
    #[must_use]
    pub fn cumulative_cost(self, level: u8) -> u64 {
        let upgrades: u64 = (1..level).map(|from| self.upgrade_cost(from)).sum();
        self.profile().cost + upgrades
    }

    /// Gold returned when a defender with the provided spend is sold.
    #[must_use]
    pub const fn refund_for(total_spent: u64) -> u64 {
        total_spent * SELL_REFUND_PERCENT / 100
    }

    /// Special effect carried by the kind's projectiles at the provided level.
    #[must_use]
    pub fn special_effect(self, level: u8) -> Option<SpecialEffect> {
        let above_base = f32::from(level.saturating_sub(1));
        let extra_levels = u32::from(level.saturating_sub(1));
        match self {
            Self::Arrow | Self::Banner => None,
            Self::Cannon => Some(SpecialEffect::Splash {
                radius: 50.0 * level_factor(0.1, level),
                factor: 0.6,
            }),
            Self::Frost => Some(SpecialEffect::Slow {
                magnitude: (0.5 + 0.05 * above_base).min(0.8),
                duration: Duration::from_millis(1_500) + Duration::from_millis(250) * extra_levels,
            }),
            Self::Tesla => Some(SpecialEffect::Chain {
                range: 90.0,
                factor: 0.8,
                decay: 0.7,
                max_hops: 2 + extra_levels,
            }),
            Self::Venom => Some(SpecialEffect::Poison {
                damage_per_tick: 4.0 * level_factor(0.3, level),
                interval: Duration::from_millis(500),
                duration: Duration::from_secs(3),
            }),
            Self::Hammer => Some(SpecialEffect::Stun {
                duration: Duration::from_millis(400) + Duration::from_millis(100) * extra_levels,
            }),
        }
    }

    /// Lowercase identifier used by configuration files.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Cannon => "cannon",
            Self::Frost => "frost",
            Self::Tesla => "tesla",
            Self::Venom => "venom",
            Self::Hammer => "hammer",
            Self::Banner => "banner",
        }
    }
}

impl FromStr for DefenderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == normalized)
            .ok_or_else(|| ConfigError::UnknownDefenderKind(value.to_owned()))
    }
}

fn level_factor(growth: f32, level: u8) -> f32 {
    assert!(
        (1..=MAX_LEVEL).contains(&level),
        "defender level {level} outside 1..={MAX_LEVEL}"
    );
    1.0 + growth * f32::from(level - 1)
}
