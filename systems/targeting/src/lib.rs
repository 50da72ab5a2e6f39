#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks deterministic defender targets from world snapshots.

use std::time::Duration;

use lane_defence_core::{
    AttackerId, AttackerView, DefenderTarget, DefenderView, TargetingStrategy, Vec2,
};

/// Selects the attacker a defender at `origin` should engage.
///
/// Only active attackers within `radius` (inclusive) are considered. Ties on
/// the strategy metric go to the lowest attacker identifier.
#[must_use]
pub fn select_target(
    origin: Vec2,
    radius: f32,
    candidates: &AttackerView,
    strategy: TargetingStrategy,
) -> Option<AttackerId> {
    let pool: Vec<Candidate> = active_candidates(candidates).collect();
    best_in_range(origin, radius, &pool, strategy)
}

/// Targeting system that reuses its candidate buffer between ticks.
#[derive(Debug, Default)]
pub struct DefenderTargeting {
    candidates: Vec<Candidate>,
}

impl DefenderTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes a target for every ready attacking defender.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Support defenders and defenders still cooling down at
    /// `now` receive no assignment.
    pub fn handle(
        &mut self,
        now: Duration,
        defenders: &DefenderView,
        attackers: &AttackerView,
        out: &mut Vec<DefenderTarget>,
    ) {
        out.clear();
        if defenders.is_empty() {
            return;
        }

        self.prepare_candidates(attackers);
        if self.candidates.is_empty() {
            return;
        }

        for defender in defenders.iter() {
            if defender.kind.is_support() || !defender.is_ready(now) {
                continue;
            }
            if let Some(attacker) = best_in_range(
                defender.position,
                defender.stats.range,
                &self.candidates,
                defender.strategy,
            ) {
                out.push(DefenderTarget {
                    defender: defender.id,
                    attacker,
                });
            }
        }
    }

    fn prepare_candidates(&mut self, attackers: &AttackerView) {
        self.candidates.clear();
        self.candidates.extend(active_candidates(attackers));
    }
}

/// Attackers defenders may engage, in view order.
fn active_candidates(attackers: &AttackerView) -> impl Iterator<Item = Candidate> + '_ {
    attackers
        .iter()
        .filter(|snapshot| snapshot.state.is_active())
        .map(|snapshot| Candidate {
            id: snapshot.id,
            position: snapshot.position,
            progress: snapshot.progress,
            hp: snapshot.hp,
        })
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: AttackerId,
    position: Vec2,
    progress: f32,
    hp: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    score: f32,
    attacker: AttackerId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.score != other.score {
            return self.score < other.score;
        }
        self.attacker < other.attacker
    }
}

fn best_in_range(
    origin: Vec2,
    radius: f32,
    candidates: &[Candidate],
    strategy: TargetingStrategy,
) -> Option<AttackerId> {
    let max_distance_sq = radius * radius;
    let mut best: Option<BestCandidate> = None;

    for candidate in candidates {
        let distance_sq = candidate.position.distance_squared(origin);
        if distance_sq > max_distance_sq {
            continue;
        }

        // Lower scores win.
        let score = match strategy {
            TargetingStrategy::First => -candidate.progress,
            TargetingStrategy::Last => candidate.progress,
            TargetingStrategy::Nearest => distance_sq,
            TargetingStrategy::Strongest => -candidate.hp,
            TargetingStrategy::Weakest => candidate.hp,
        };
        let current = BestCandidate {
            score,
            attacker: candidate.id,
        };

        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|candidate| candidate.attacker)
}
