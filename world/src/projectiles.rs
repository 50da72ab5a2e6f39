//! Homing projectiles fired by defenders.

use std::{collections::BTreeMap, time::Duration};

use lane_defence_core::{
    AttackerId, DefenderId, Playfield, ProjectileId, ProjectileSnapshot, SpecialEffect, Vec2,
};

use crate::attackers::AttackerRegistry;

/// A projectile touches its aim point once it is strictly closer than this.
pub(crate) const CONTACT_RADIUS: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Aim {
    Tracking { attacker: AttackerId, last_known: Vec2 },
    Lost { point: Vec2 },
}

/// Outcome of moving a projectile for one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flight {
    InFlight,
    Hit(AttackerId),
    Missed,
}

/// Projectile stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) defender: DefenderId,
    pub(crate) position: Vec2,
    pub(crate) damage: f32,
    pub(crate) effect: Option<SpecialEffect>,
    speed: f32,
    aim: Aim,
    finished: bool,
}

impl Projectile {
    /// Moves toward the target by `speed × dt`.
    ///
    /// While the target stays active the projectile follows it. Once the
    /// target stops being active the projectile keeps flying to the last point
    /// it saw the target at and reports a miss on arrival.
    pub(crate) fn step(
        &mut self,
        dt: Duration,
        attackers: &AttackerRegistry,
        playfield: &Playfield,
    ) -> Flight {
        if self.finished {
            return Flight::Missed;
        }

        let destination = match self.aim {
            Aim::Tracking {
                attacker,
                last_known,
            } => match attackers
                .get(attacker)
                .filter(|target| target.state.is_active())
            {
                Some(target) => {
                    self.aim = Aim::Tracking {
                        attacker,
                        last_known: target.position,
                    };
                    target.position
                }
                None => {
                    self.aim = Aim::Lost { point: last_known };
                    last_known
                }
            },
            Aim::Lost { point } => point,
        };

        let offset = destination - self.position;
        let distance = offset.length();
        let travel = self.speed * dt.as_secs_f32();
        if distance <= travel {
            self.position = destination;
        } else {
            self.position += offset / distance * travel;
        }

        if !playfield.contains(self.position) {
            self.finished = true;
            return Flight::Missed;
        }

        if self.position.distance(destination) >= CONTACT_RADIUS {
            return Flight::InFlight;
        }

        self.finished = true;
        match self.aim {
            Aim::Tracking { attacker, .. } => Flight::Hit(attacker),
            Aim::Lost { .. } => Flight::Missed,
        }
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            defender: self.defender,
            position: self.position,
            tracking: match self.aim {
                Aim::Tracking { attacker, .. } => Some(attacker),
                Aim::Lost { .. } => None,
            },
        }
    }
}

/// Parameters of a projectile about to be launched.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) defender: DefenderId,
    pub(crate) origin: Vec2,
    pub(crate) target: AttackerId,
    pub(crate) target_position: Vec2,
    pub(crate) damage: f32,
    pub(crate) speed: f32,
    pub(crate) effect: Option<SpecialEffect>,
}

/// Registry that stores projectiles and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    entries: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(&mut self, launch: Launch) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        let projectile = Projectile {
            id,
            defender: launch.defender,
            position: launch.origin,
            damage: launch.damage,
            effect: launch.effect,
            speed: launch.speed,
            aim: Aim::Tracking {
                attacker: launch.target,
                last_known: launch.target_position,
            },
            finished: false,
        };
        let _ = self.entries.insert(id, projectile);
        id
    }

    /// Projectiles still in flight, in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.entries.values().filter(|projectile| !projectile.finished)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.entries
            .values_mut()
            .filter(|projectile| !projectile.finished)
    }

    /// Drops projectiles that hit or missed.
    pub(crate) fn prune_finished(&mut self) {
        self.entries.retain(|_, projectile| !projectile.finished);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use lane_defence_core::{AttackerKind, DamageType};

    fn setup() -> (Path, Playfield, AttackerRegistry) {
        let path = Path::new(vec![Vec2::new(0.0, 0.0), Vec2::new(400.0, 0.0)]).expect("path");
        let playfield =
            Playfield::new(Vec2::new(-100.0, -100.0), Vec2::new(500.0, 100.0)).expect("playfield");
        (path, playfield, AttackerRegistry::new())
    }

    fn launch_at(registry: &mut ProjectileRegistry, attackers: &AttackerRegistry, target: AttackerId) {
        let position = attackers.get(target).expect("target").position;
        let _ = registry.launch(Launch {
            defender: DefenderId::new(0),
            origin: Vec2::new(100.0, 50.0),
            target,
            target_position: position,
            damage: 10.0,
            speed: 100.0,
            effect: None,
        });
    }

    #[test]
    fn projectile_homes_in_and_hits() {
        let (path, playfield, mut attackers) = setup();
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 100.0);
        let mut projectiles = ProjectileRegistry::new();
        launch_at(&mut projectiles, &attackers, target);

        let mut flights = Vec::new();
        for projectile in projectiles.iter_mut() {
            flights.push(projectile.step(Duration::from_millis(250), &attackers, &playfield));
        }
        assert_eq!(flights, vec![Flight::InFlight]);

        flights.clear();
        for projectile in projectiles.iter_mut() {
            flights.push(projectile.step(Duration::from_millis(250), &attackers, &playfield));
        }
        assert_eq!(flights, vec![Flight::Hit(target)]);

        projectiles.prune_finished();
        assert_eq!(projectiles.len(), 0);
    }

    #[test]
    fn stopping_exactly_at_contact_radius_is_not_a_hit() {
        let (path, playfield, mut attackers) = setup();
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 100.0);
        let mut projectiles = ProjectileRegistry::new();
        let _ = projectiles.launch(Launch {
            defender: DefenderId::new(0),
            origin: Vec2::new(100.0, 50.0),
            target,
            target_position: Vec2::new(100.0, 0.0),
            damage: 10.0,
            speed: 50.0 - CONTACT_RADIUS,
            effect: None,
        });

        let mut flights = Vec::new();
        for projectile in projectiles.iter_mut() {
            flights.push(projectile.step(Duration::from_secs(1), &attackers, &playfield));
        }
        assert_eq!(flights, vec![Flight::InFlight]);

        flights.clear();
        for projectile in projectiles.iter_mut() {
            flights.push(projectile.step(Duration::from_secs(1), &attackers, &playfield));
        }
        assert_eq!(flights, vec![Flight::Hit(target)]);
    }

    #[test]
    fn projectile_misses_when_target_dies_in_flight() {
        let (path, playfield, mut attackers) = setup();
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 100.0);
        let mut projectiles = ProjectileRegistry::new();
        launch_at(&mut projectiles, &attackers, target);

        let _ = attackers
            .get_mut(target)
            .expect("target")
            .take_damage(1_000.0, DamageType::Physical);

        let mut outcome = Flight::InFlight;
        for _ in 0..4 {
            for projectile in projectiles.iter_mut() {
                outcome = projectile.step(Duration::from_millis(250), &attackers, &playfield);
            }
        }
        assert_eq!(outcome, Flight::Missed);
        assert_eq!(projectiles.iter().count(), 0);
    }

    #[test]
    fn leaving_the_playfield_is_a_miss() {
        let (path, _, mut attackers) = setup();
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 100.0);
        let tight = Playfield::new(Vec2::new(90.0, 40.0), Vec2::new(110.0, 60.0)).expect("playfield");
        let mut projectiles = ProjectileRegistry::new();
        launch_at(&mut projectiles, &attackers, target);

        let mut outcomes = Vec::new();
        for projectile in projectiles.iter_mut() {
            outcomes.push(projectile.step(Duration::from_millis(250), &attackers, &tight));
        }
        assert_eq!(outcomes, vec![Flight::Missed]);
    }

    #[test]
    fn snapshot_drops_tracking_once_target_is_lost() {
        let (path, playfield, mut attackers) = setup();
        let target = attackers.spawn_active_at(AttackerKind::Grunt, &path, 100.0);
        let mut projectiles = ProjectileRegistry::new();
        launch_at(&mut projectiles, &attackers, target);
        assert_eq!(
            projectiles.iter().map(|p| p.snapshot().tracking).collect::<Vec<_>>(),
            vec![Some(target)]
        );

        let _ = attackers
            .get_mut(target)
            .expect("target")
            .take_damage(1_000.0, DamageType::Physical);
        for projectile in projectiles.iter_mut() {
            let _ = projectile.step(Duration::from_millis(100), &attackers, &playfield);
        }
        assert_eq!(
            projectiles.iter().map(|p| p.snapshot().tracking).collect::<Vec<_>>(),
            vec![None]
        );
    }
}
