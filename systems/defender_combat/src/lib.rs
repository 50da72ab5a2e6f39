#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use std::time::Duration;

use lane_defence_core::{
    Command, DefenderSnapshot, DefenderTarget, DefenderView, AURA_DAMAGE_PER_LEVEL,
};

/// Defender combat system that queues firing commands for ready defenders.
#[derive(Debug, Default)]
pub struct DefenderCombat {
    scratch: Vec<Command>,
}

impl DefenderCombat {
    /// Creates a new defender combat system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for defenders ready to fire at `now`.
    ///
    /// Each command carries the aura bonus the shooter receives from nearby
    /// support defenders.
    pub fn handle(
        &mut self,
        now: Duration,
        defenders: &DefenderView,
        targets: &[DefenderTarget],
        out: &mut Vec<Command>,
    ) {
        if targets.is_empty() || defenders.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            let Some(shooter) = defenders.get(target.defender) else {
                continue;
            };
            if shooter.kind.is_support() || !shooter.is_ready(now) {
                continue;
            }
            self.scratch.push(Command::FireProjectile {
                defender: target.defender,
                target: target.attacker,
                buff: aura_bonus(shooter, defenders),
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

/// Additive damage bonus granted to `shooter` by support defenders whose aura
/// covers it. Every covering support adds [`AURA_DAMAGE_PER_LEVEL`] per level.
#[must_use]
pub fn aura_bonus(shooter: &DefenderSnapshot, defenders: &DefenderView) -> f32 {
    defenders
        .iter()
        .filter(|support| support.kind.is_support() && support.id != shooter.id)
        .filter(|support| {
            let radius = support.stats.range;
            support.position.distance_squared(shooter.position) <= radius * radius
        })
        .map(|support| AURA_DAMAGE_PER_LEVEL * f32::from(support.level))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{AttackerId, DefenderId, DefenderKind, TargetingStrategy, Vec2};

    fn snapshot(id: u32, kind: DefenderKind, position: Vec2, level: u8) -> DefenderSnapshot {
        DefenderSnapshot {
            id: DefenderId::new(id),
            kind,
            position,
            level,
            stats: kind.stats_at(level),
            cooldown_until: Duration::ZERO,
            strategy: TargetingStrategy::First,
            total_spent: kind.cumulative_cost(level),
        }
    }

    fn target(defender: u32, attacker: u32) -> DefenderTarget {
        DefenderTarget {
            defender: DefenderId::new(defender),
            attacker: AttackerId::new(attacker),
        }
    }

    #[test]
    fn ready_defenders_fire_without_buff() {
        let mut system = DefenderCombat::new();
        let defenders = DefenderView::from_snapshots(vec![
            snapshot(2, DefenderKind::Arrow, Vec2::ZERO, 1),
            snapshot(5, DefenderKind::Cannon, Vec2::new(500.0, 0.0), 1),
        ]);
        let mut out = Vec::new();

        system.handle(
            Duration::ZERO,
            &defenders,
            &[target(2, 4), target(5, 1)],
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    defender: DefenderId::new(2),
                    target: AttackerId::new(4),
                    buff: 0.0,
                },
                Command::FireProjectile {
                    defender: DefenderId::new(5),
                    target: AttackerId::new(1),
                    buff: 0.0,
                },
            ]
        );
    }

    #[test]
    fn cooling_missing_and_support_defenders_are_skipped() {
        let mut system = DefenderCombat::new();
        let mut cooling = snapshot(3, DefenderKind::Arrow, Vec2::ZERO, 1);
        cooling.cooldown_until = Duration::from_millis(250);
        let defenders = DefenderView::from_snapshots(vec![
            cooling,
            snapshot(4, DefenderKind::Banner, Vec2::ZERO, 1),
            snapshot(8, DefenderKind::Frost, Vec2::ZERO, 1),
        ]);
        let mut out = Vec::new();

        system.handle(
            Duration::from_millis(100),
            &defenders,
            &[target(3, 9), target(4, 9), target(8, 2), target(42, 3)],
            &mut out,
        );

        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Command::FireProjectile { defender, .. } if defender == DefenderId::new(8)
        ));
    }

    #[test]
    fn auras_stack_per_covering_banner_and_level() {
        let shooter = snapshot(0, DefenderKind::Arrow, Vec2::ZERO, 1);
        let defenders = DefenderView::from_snapshots(vec![
            shooter,
            snapshot(1, DefenderKind::Banner, Vec2::new(50.0, 0.0), 1),
            snapshot(2, DefenderKind::Banner, Vec2::new(0.0, 60.0), 3),
            snapshot(3, DefenderKind::Banner, Vec2::new(1_000.0, 0.0), 4),
        ]);

        let bonus = aura_bonus(&shooter, &defenders);
        assert!((bonus - 0.4).abs() < 1e-6, "bonus was {bonus}");
    }

    #[test]
    fn banner_does_not_buff_itself() {
        let banner = snapshot(0, DefenderKind::Banner, Vec2::ZERO, 2);
        let defenders = DefenderView::from_snapshots(vec![banner]);
        assert_eq!(aura_bonus(&banner, &defenders), 0.0);
    }
}
