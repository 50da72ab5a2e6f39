//! Projectile special effects and the status effects they leave on attackers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Floor applied to the movement factor of a slowed attacker.
const MIN_SPEED_FACTOR: f32 = 0.1;

/// Damage channel that selects the mitigation rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Reduced by flat armor, never below one point.
    Physical,
    /// Reduced by the resist fraction.
    Magic,
}

/// Effect carried by a projectile and resolved on contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpecialEffect {
    /// Area damage around the target with linear falloff.
    Splash {
        /// Radius of the blast around the target.
        radius: f32,
        /// Fraction of the projectile damage dealt at the centre.
        factor: f32,
    },
    /// Reduces the target's movement speed.
    Slow {
        /// Fraction of speed removed.
        magnitude: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
    /// Magic damage hopping between nearby attackers.
    Chain {
        /// Maximum distance covered by a single hop.
        range: f32,
        /// Fraction of the projectile damage dealt by the first hop.
        factor: f32,
        /// Multiplier applied per additional hop.
        decay: f32,
        /// Maximum number of hops after the primary target.
        max_hops: u32,
    },
    /// Magic damage over time.
    Poison {
        /// Damage dealt per interval.
        damage_per_tick: f32,
        /// Time between two damage ticks.
        interval: Duration,
        /// How long the poison lasts.
        duration: Duration,
    },
    /// Halts the target.
    Stun {
        /// How long the stun lasts.
        duration: Duration,
    },
}

/// Kinds of status effects that attach to attackers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Movement slow.
    Slow,
    /// Damage over time.
    Dot,
    /// Movement halt.
    Stun,
}

/// A timed status effect attached to an attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    kind: StatusKind,
    magnitude: f32,
    remaining: Duration,
    tick_interval: Option<Duration>,
    since_tick: Duration,
}

impl StatusEffect {
    /// Creates a slow removing `magnitude` of the attacker's speed.
    #[must_use]
    pub fn slow(magnitude: f32, duration: Duration) -> Self {
        Self {
            kind: StatusKind::Slow,
            magnitude: magnitude.clamp(0.0, 1.0),
            remaining: duration,
            tick_interval: None,
            since_tick: Duration::ZERO,
        }
    }

    /// Creates a damage-over-time effect dealing `damage` magic damage per `interval`.
    #[must_use]
    pub fn dot(damage: f32, interval: Duration, duration: Duration) -> Self {
        debug_assert!(!interval.is_zero(), "dot interval must be non-zero");
        Self {
            kind: StatusKind::Dot,
            magnitude: damage.max(0.0),
            remaining: duration,
            tick_interval: Some(interval),
            since_tick: Duration::ZERO,
        }
    }

    /// Creates a stun lasting `duration`.
    #[must_use]
    pub fn stun(duration: Duration) -> Self {
        Self {
            kind: StatusKind::Stun,
            magnitude: 1.0,
            remaining: duration,
            tick_interval: None,
            since_tick: Duration::ZERO,
        }
    }

    /// Kind of the effect.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        self.kind
    }

    /// Strength of the effect; the speed fraction removed or the damage per tick.
    #[must_use]
    pub const fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// Time left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Folds a same-kind effect into this one.
    ///
    /// The longer remaining duration and the stronger magnitude survive.
    /// Magnitudes never add up. The tick phase of an ongoing damage-over-time
    /// effect is kept.
    pub fn merge(&mut self, incoming: StatusEffect) {
        debug_assert_eq!(self.kind, incoming.kind, "merge requires matching kinds");
        self.remaining = self.remaining.max(incoming.remaining);
        self.magnitude = self.magnitude.max(incoming.magnitude);
        if self.tick_interval.is_none() {
            self.tick_interval = incoming.tick_interval;
        }
    }

    /// Consumes `dt` of the effect's lifetime and returns the damage that came due.
    fn advance(&mut self, dt: Duration) -> f32 {
        let active = dt.min(self.remaining);
        self.remaining -= active;

        let Some(interval) = self.tick_interval.filter(|interval| !interval.is_zero()) else {
            return 0.0;
        };

        self.since_tick += active;
        let mut damage = 0.0;
        while self.since_tick >= interval {
            self.since_tick -= interval;
            damage += self.magnitude;
        }
        damage
    }
}

/// Collection of status effects attached to one attacker, at most one per kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `effect`, merging it into an existing effect of the same kind.
    pub fn apply(&mut self, effect: StatusEffect) {
        match self
            .effects
            .iter_mut()
            .find(|existing| existing.kind == effect.kind)
        {
            Some(existing) => existing.merge(effect),
            None => self.effects.push(effect),
        }
    }

    /// Returns the effect of the provided kind, if attached.
    #[must_use]
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|effect| effect.kind == kind)
    }

    /// Iterator over attached effects.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Reports whether no effect is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Factor applied to base speed: zero while stunned, otherwise
    /// `max(0.1, 1 − strongest slow)`.
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        let mut strongest_slow: f32 = 0.0;
        for effect in &self.effects {
            match effect.kind {
                StatusKind::Stun => return 0.0,
                StatusKind::Slow => strongest_slow = strongest_slow.max(effect.magnitude),
                StatusKind::Dot => {}
            }
        }
        (1.0 - strongest_slow).max(MIN_SPEED_FACTOR)
    }

    /// Advances every effect by `dt`, purges expired ones and returns the
    /// magic damage that came due.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        let mut damage = 0.0;
        for effect in &mut self.effects {
            damage += effect.advance(dt);
        }
        self.effects.retain(|effect| !effect.remaining.is_zero());
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slows_merge_to_longer_duration_without_stacking() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::slow(0.5, Duration::from_millis(1_000)));
        effects.apply(StatusEffect::slow(0.5, Duration::from_millis(2_000)));

        let slows: Vec<_> = effects
            .iter()
            .filter(|effect| effect.kind() == StatusKind::Slow)
            .collect();
        assert_eq!(slows.len(), 1);
        assert_eq!(slows[0].magnitude(), 0.5);
        assert_eq!(slows[0].remaining(), Duration::from_millis(2_000));
        assert_eq!(effects.speed_factor(), 0.5);
    }

    #[test]
    fn strongest_slow_wins() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::slow(0.3, Duration::from_secs(5)));
        effects.apply(StatusEffect::slow(0.6, Duration::from_secs(1)));
        assert!((effects.speed_factor() - 0.4).abs() < 1e-6);
        assert_eq!(
            effects.get(StatusKind::Slow).map(StatusEffect::remaining),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn speed_factor_is_floored() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::slow(1.0, Duration::from_secs(1)));
        assert!((effects.speed_factor() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn stun_halts_movement() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::slow(0.2, Duration::from_secs(1)));
        effects.apply(StatusEffect::stun(Duration::from_millis(300)));
        assert_eq!(effects.speed_factor(), 0.0);

        let _ = effects.advance(Duration::from_millis(300));
        assert!((effects.speed_factor() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn dot_ticks_once_per_interval() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::dot(
            4.0,
            Duration::from_millis(500),
            Duration::from_secs(2),
        ));

        assert_eq!(effects.advance(Duration::from_millis(400)), 0.0);
        assert_eq!(effects.advance(Duration::from_millis(400)), 4.0);
        assert_eq!(effects.advance(Duration::from_millis(1_200)), 12.0);
        assert!(effects.get(StatusKind::Dot).is_none(), "expired dot is purged");
    }

    #[test]
    fn dot_stops_ticking_after_expiry() {
        let mut effects = StatusEffects::new();
        effects.apply(StatusEffect::dot(
            3.0,
            Duration::from_millis(500),
            Duration::from_millis(1_000),
        ));
        assert_eq!(effects.advance(Duration::from_secs(10)), 6.0);
        assert!(effects.is_empty());
    }
}
