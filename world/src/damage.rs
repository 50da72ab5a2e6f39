//! Damage resolution for projectile contacts and status ticks.

use lane_defence_core::{AttackerId, DamageType, Event, SpecialEffect, StatusEffect, Vec2};
use tracing::debug;

use crate::{
    attackers::{AttackerRegistry, DamageOutcome},
    economy::Ledger,
};

/// Reports a damage outcome and credits the kill reward when the hit was lethal.
pub(crate) fn settle(
    attackers: &AttackerRegistry,
    ledger: &mut Ledger,
    attacker: AttackerId,
    outcome: DamageOutcome,
    damage_type: DamageType,
    out_events: &mut Vec<Event>,
) {
    out_events.push(Event::AttackerDamaged {
        attacker,
        amount: outcome.amount,
        damage_type,
    });

    if !outcome.killed {
        return;
    }

    let reward = attackers.get(attacker).map_or(0, |victim| victim.reward);
    ledger.credit(reward);
    debug!(attacker = attacker.get(), reward, "attacker killed");
    out_events.push(Event::AttackerKilled { attacker, reward });
}

fn strike(
    attackers: &mut AttackerRegistry,
    ledger: &mut Ledger,
    attacker: AttackerId,
    amount: f32,
    damage_type: DamageType,
    out_events: &mut Vec<Event>,
) {
    let Some(outcome) = attackers
        .get_mut(attacker)
        .and_then(|victim| victim.take_damage(amount, damage_type))
    else {
        return;
    };
    settle(attackers, ledger, attacker, outcome, damage_type, out_events);
}

fn afflict(
    attackers: &mut AttackerRegistry,
    attacker: AttackerId,
    effect: StatusEffect,
    out_events: &mut Vec<Event>,
) {
    let applied = attackers
        .get_mut(attacker)
        .is_some_and(|victim| victim.apply_status(effect));
    if applied {
        out_events.push(Event::StatusApplied {
            attacker,
            kind: effect.kind(),
        });
    }
}

/// Resolves a projectile that touched `target`.
///
/// The primary hit is physical. Splash and chain secondaries are computed
/// from positions captured at contact time and skip attackers that are no
/// longer active.
pub(crate) fn resolve_hit(
    attackers: &mut AttackerRegistry,
    ledger: &mut Ledger,
    target: AttackerId,
    damage: f32,
    effect: Option<SpecialEffect>,
    out_events: &mut Vec<Event>,
) {
    let Some(origin) = attackers
        .get(target)
        .filter(|victim| victim.state.is_active())
        .map(|victim| victim.position)
    else {
        return;
    };

    strike(attackers, ledger, target, damage, DamageType::Physical, out_events);

    let Some(effect) = effect else {
        return;
    };

    match effect {
        SpecialEffect::Splash { radius, factor } => {
            if radius <= 0.0 {
                return;
            }
            let victims: Vec<(AttackerId, f32)> = attackers
                .iter()
                .filter(|victim| victim.id != target && victim.state.is_active())
                .filter_map(|victim| {
                    let distance = victim.position.distance(origin);
                    (distance <= radius).then_some((victim.id, distance))
                })
                .collect();
            for (victim, distance) in victims {
                let falloff = 1.0 - 0.5 * (distance / radius);
                strike(
                    attackers,
                    ledger,
                    victim,
                    damage * factor * falloff,
                    DamageType::Physical,
                    out_events,
                );
            }
        }
        SpecialEffect::Chain {
            range,
            factor,
            decay,
            max_hops,
        } => {
            let mut visited = vec![target];
            let mut from = origin;
            for hop in 0..max_hops {
                let Some((next, position)) = nearest_unvisited(attackers, from, range, &visited)
                else {
                    break;
                };
                let hop_damage = damage * factor * decay.powi(hop as i32);
                strike(attackers, ledger, next, hop_damage, DamageType::Magic, out_events);
                visited.push(next);
                from = position;
            }
        }
        SpecialEffect::Slow {
            magnitude,
            duration,
        } => afflict(
            attackers,
            target,
            StatusEffect::slow(magnitude, duration),
            out_events,
        ),
        SpecialEffect::Poison {
            damage_per_tick,
            interval,
            duration,
        } => afflict(
            attackers,
            target,
            StatusEffect::dot(damage_per_tick, interval, duration),
            out_events,
        ),
        SpecialEffect::Stun { duration } => {
            afflict(attackers, target, StatusEffect::stun(duration), out_events)
        }
    }
}

fn nearest_unvisited(
    attackers: &AttackerRegistry,
    from: Vec2,
    range: f32,
    visited: &[AttackerId],
) -> Option<(AttackerId, Vec2)> {
    let range_squared = range * range;
    let mut best: Option<(AttackerId, Vec2, f32)> = None;
    for candidate in attackers.iter() {
        if !candidate.state.is_active() || visited.contains(&candidate.id) {
            continue;
        }
        let distance_squared = candidate.position.distance_squared(from);
        if distance_squared > range_squared {
            continue;
        }
        if best.map_or(true, |(_, _, best_distance)| distance_squared < best_distance) {
            best = Some((candidate.id, candidate.position, distance_squared));
        }
    }
    best.map(|(id, position, _)| (id, position))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::path::Path;
    use lane_defence_core::{AttackerKind, AttackerState, StatusKind};

    fn long_path() -> Path {
        Path::new(vec![Vec2::new(0.0, 0.0), Vec2::new(2_000.0, 0.0)]).expect("path")
    }

    fn damage_to(events: &[Event], attacker: AttackerId) -> Vec<f32> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::AttackerDamaged {
                    attacker: damaged,
                    amount,
                    ..
                } if *damaged == attacker => Some(*amount),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn kill_credits_reward_once() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 10.0);
        let mut events = Vec::new();

        resolve_hit(&mut attackers, &mut ledger, target, 100.0, None, &mut events);
        resolve_hit(&mut attackers, &mut ledger, target, 100.0, None, &mut events);

        assert_eq!(ledger.balance(), 5);
        assert_eq!(
            events,
            vec![
                Event::AttackerDamaged {
                    attacker: target,
                    amount: 50.0,
                    damage_type: DamageType::Physical,
                },
                Event::AttackerKilled {
                    attacker: target,
                    reward: 5,
                },
            ]
        );
    }

    #[test]
    fn chain_hits_bounded_targets_with_decaying_damage() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let ids: Vec<AttackerId> = (0..6)
            .map(|index| attackers.spawn_active_at(AttackerKind::Overlord, &path, 85.0 * index as f32))
            .collect();

        let mut events = Vec::new();
        resolve_hit(
            &mut attackers,
            &mut ledger,
            ids[0],
            20.0,
            Some(SpecialEffect::Chain {
                range: 90.0,
                factor: 0.8,
                decay: 0.7,
                max_hops: 3,
            }),
            &mut events,
        );

        let damaged: Vec<AttackerId> = ids
            .iter()
            .copied()
            .filter(|id| !damage_to(&events, *id).is_empty())
            .collect();
        assert_eq!(damaged, ids[..4].to_vec());

        let hops: Vec<f32> = ids[1..4]
            .iter()
            .flat_map(|id| damage_to(&events, *id))
            .collect();
        assert_eq!(hops.len(), 3);
        assert!(hops.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn chain_stops_when_nothing_is_in_range() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let first = attackers.spawn_active_at(AttackerKind::Brute, &path, 0.0);
        let second = attackers.spawn_active_at(AttackerKind::Brute, &path, 50.0);
        let _far = attackers.spawn_active_at(AttackerKind::Brute, &path, 500.0);

        let mut events = Vec::new();
        resolve_hit(
            &mut attackers,
            &mut ledger,
            first,
            10.0,
            Some(SpecialEffect::Chain {
                range: 90.0,
                factor: 0.8,
                decay: 0.7,
                max_hops: 5,
            }),
            &mut events,
        );

        let damaged = events
            .iter()
            .filter(|event| matches!(event, Event::AttackerDamaged { .. }))
            .count();
        assert_eq!(damaged, 2);
        assert_eq!(damage_to(&events, second).len(), 1);
    }

    #[test]
    fn splash_falls_off_with_distance() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let target = attackers.spawn_active_at(AttackerKind::Overlord, &path, 100.0);
        let near = attackers.spawn_active_at(AttackerKind::Overlord, &path, 100.0);
        let edge = attackers.spawn_active_at(AttackerKind::Overlord, &path, 150.0);
        let outside = attackers.spawn_active_at(AttackerKind::Overlord, &path, 151.0);

        let mut events = Vec::new();
        resolve_hit(
            &mut attackers,
            &mut ledger,
            target,
            100.0,
            Some(SpecialEffect::Splash {
                radius: 50.0,
                factor: 0.6,
            }),
            &mut events,
        );

        // Overlords carry six armor.
        let single = |id| {
            let amounts = damage_to(&events, id);
            assert_eq!(amounts.len(), 1);
            amounts[0]
        };
        assert!((single(target) - 94.0).abs() < 1e-3);
        assert!((single(near) - 54.0).abs() < 1e-3);
        assert!((single(edge) - 24.0).abs() < 1e-3);
        assert!(damage_to(&events, outside).is_empty());
    }

    #[test]
    fn statuses_attach_to_surviving_target() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let target = attackers.spawn_active_at(AttackerKind::Brute, &path, 10.0);

        let mut events = Vec::new();
        resolve_hit(
            &mut attackers,
            &mut ledger,
            target,
            10.0,
            Some(SpecialEffect::Slow {
                magnitude: 0.5,
                duration: Duration::from_secs(1),
            }),
            &mut events,
        );
        assert!(events.contains(&Event::StatusApplied {
            attacker: target,
            kind: StatusKind::Slow,
        }));
        let victim = attackers.get(target).expect("alive");
        assert!(victim.statuses().get(StatusKind::Slow).is_some());
    }

    #[test]
    fn lethal_hit_skips_status() {
        let path = long_path();
        let mut attackers = AttackerRegistry::new();
        let mut ledger = Ledger::new(0);
        let target = attackers.spawn_active_at(AttackerKind::Runner, &path, 10.0);

        let mut events = Vec::new();
        resolve_hit(
            &mut attackers,
            &mut ledger,
            target,
            100.0,
            Some(SpecialEffect::Stun {
                duration: Duration::from_secs(1),
            }),
            &mut events,
        );
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::StatusApplied { .. })));
        assert_eq!(
            attackers.get(target).map(|victim| victim.state),
            Some(AttackerState::Dying)
        );
    }
}
