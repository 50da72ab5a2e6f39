//! Attacker lifecycle and the registry that owns every attacker.

use std::{collections::BTreeMap, time::Duration};

use lane_defence_core::{
    AttackerId, AttackerKind, AttackerSnapshot, AttackerState, DamageType, StatusEffect,
    StatusEffects, Vec2, WaveId, RESIST_CAP,
};

use crate::path::{Path, PathCursor};

/// Time a killed attacker lingers before it is removed.
pub(crate) const DYING_DURATION: Duration = Duration::from_millis(250);

/// Damage that landed on an attacker after mitigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageOutcome {
    pub(crate) amount: f32,
    pub(crate) killed: bool,
}

/// What happened to an attacker during a single update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AttackerReport {
    pub(crate) activated: bool,
    pub(crate) status_damage: Option<DamageOutcome>,
    pub(crate) leaked: bool,
}

/// Attacker stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Attacker {
    pub(crate) id: AttackerId,
    pub(crate) kind: AttackerKind,
    pub(crate) wave: WaveId,
    pub(crate) state: AttackerState,
    pub(crate) max_hp: f32,
    pub(crate) hp: f32,
    pub(crate) armor: f32,
    pub(crate) resist: f32,
    pub(crate) speed: f32,
    pub(crate) reward: u64,
    pub(crate) lives_cost: u32,
    pub(crate) position: Vec2,
    pub(crate) heading: Vec2,
    pub(crate) progress: f32,
    cursor: PathCursor,
    statuses: StatusEffects,
    dying_remaining: Duration,
}

impl Attacker {
    fn spawn(id: AttackerId, kind: AttackerKind, wave: WaveId, path: &Path) -> Self {
        let stats = kind.stats_for_wave(wave);
        let cursor = path.start();
        let sample = path.sample(&cursor);
        Self {
            id,
            kind,
            wave,
            state: AttackerState::Spawning,
            max_hp: stats.max_hp,
            hp: stats.max_hp,
            armor: stats.armor,
            resist: stats.resist,
            speed: stats.speed,
            reward: stats.reward,
            lives_cost: stats.lives_cost,
            position: sample.position,
            heading: sample.heading,
            progress: 0.0,
            cursor,
            statuses: StatusEffects::new(),
            dying_remaining: Duration::ZERO,
        }
    }

    /// Advances the attacker's lifecycle by `dt`.
    ///
    /// Spawning attackers activate without moving. Active attackers tick their
    /// statuses and then travel `speed × factor × dt`, where the factor is
    /// sampled before the statuses count down.
    pub(crate) fn update(&mut self, dt: Duration, path: &Path) -> AttackerReport {
        let mut report = AttackerReport::default();
        match self.state {
            AttackerState::Spawning => {
                self.state = AttackerState::Active;
                report.activated = true;
            }
            AttackerState::Active => {
                let speed_factor = self.statuses.speed_factor();
                let status_damage = self.statuses.advance(dt);
                if status_damage > 0.0 {
                    report.status_damage = self.take_damage(status_damage, DamageType::Magic);
                    if !self.state.is_active() {
                        return report;
                    }
                }

                let distance = self.speed * speed_factor * dt.as_secs_f32();
                let sample = path.advance(&mut self.cursor, distance);
                self.position = sample.position;
                self.heading = sample.heading;
                self.progress = path.progress(&self.cursor);
                if sample.reached_end {
                    self.state = AttackerState::Removed;
                    report.leaked = true;
                }
            }
            AttackerState::Dying => {
                self.dying_remaining = self.dying_remaining.saturating_sub(dt);
                if self.dying_remaining.is_zero() {
                    self.state = AttackerState::Removed;
                }
            }
            AttackerState::Removed => {}
        }
        report
    }

    /// Applies mitigated damage. Attackers that are not active ignore it.
    ///
    /// Physical damage loses the flat armor value but never drops below one
    /// point. Magic damage is scaled by `1 − resist`, with resist capped.
    pub(crate) fn take_damage(&mut self, amount: f32, damage_type: DamageType) -> Option<DamageOutcome> {
        assert!(
            amount.is_finite() && amount >= 0.0,
            "damage must be finite and non-negative, got {amount}"
        );
        if !self.state.is_active() {
            return None;
        }

        let effective = match damage_type {
            DamageType::Physical => (amount - self.armor).max(1.0),
            DamageType::Magic => amount * (1.0 - self.resist.clamp(0.0, RESIST_CAP)),
        };

        let outcome = if effective >= self.hp {
            let dealt = self.hp;
            self.hp = 0.0;
            self.state = AttackerState::Dying;
            self.dying_remaining = DYING_DURATION;
            DamageOutcome {
                amount: dealt,
                killed: true,
            }
        } else {
            self.hp -= effective;
            DamageOutcome {
                amount: effective,
                killed: false,
            }
        };

        assert!(
            self.hp >= 0.0 && self.hp <= self.max_hp,
            "attacker {} health {} escaped [0, {}]",
            self.id.get(),
            self.hp,
            self.max_hp
        );
        Some(outcome)
    }

    /// Attaches a status effect. Returns `false` when the attacker is not active.
    pub(crate) fn apply_status(&mut self, effect: StatusEffect) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.statuses.apply(effect);
        true
    }

    #[cfg(test)]
    pub(crate) fn statuses(&self) -> &StatusEffects {
        &self.statuses
    }

    pub(crate) fn snapshot(&self) -> AttackerSnapshot {
        AttackerSnapshot {
            id: self.id,
            kind: self.kind,
            wave: self.wave,
            state: self.state,
            position: self.position,
            heading: self.heading,
            progress: self.progress,
            hp: self.hp,
            max_hp: self.max_hp,
        }
    }
}

/// Registry that stores attackers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct AttackerRegistry {
    entries: BTreeMap<AttackerId, Attacker>,
    next_attacker_id: AttackerId,
}

impl AttackerRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_attacker_id: AttackerId::new(0),
        }
    }

    /// Creates a spawning attacker on the first waypoint.
    pub(crate) fn spawn(&mut self, kind: AttackerKind, wave: WaveId, path: &Path) -> AttackerId {
        let id = self.next_attacker_id;
        self.next_attacker_id = AttackerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Attacker::spawn(id, kind, wave, path));
        id
    }

    pub(crate) fn get(&self, id: AttackerId) -> Option<&Attacker> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AttackerId) -> Option<&mut Attacker> {
        self.entries.get_mut(&id)
    }

    /// Attackers in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Attacker> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attacker> {
        self.entries.values_mut()
    }

    /// Drops every removed attacker and returns their identifiers.
    pub(crate) fn prune_removed(&mut self) -> Vec<AttackerId> {
        let removed: Vec<AttackerId> = self
            .entries
            .values()
            .filter(|attacker| attacker.state == AttackerState::Removed)
            .map(|attacker| attacker.id)
            .collect();
        for id in &removed {
            let _ = self.entries.remove(id);
        }
        removed
    }

    /// Places an already active attacker `distance` units along the path.
    #[cfg(test)]
    pub(crate) fn spawn_active_at(
        &mut self,
        kind: AttackerKind,
        path: &Path,
        distance: f32,
    ) -> AttackerId {
        let id = self.spawn(kind, WaveId::new(1), path);
        if let Some(attacker) = self.entries.get_mut(&id) {
            attacker.state = AttackerState::Active;
            let sample = path.advance(&mut attacker.cursor, distance);
            attacker.position = sample.position;
            attacker.heading = sample.heading;
            attacker.progress = path.progress(&attacker.cursor);
        }
        id
    }
}
