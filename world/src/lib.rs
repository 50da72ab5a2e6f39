#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Lane Defence.
//!
//! The world owns every attacker, defender and projectile together with the
//! gold ledger and the lives pool. It is only ever mutated through [`apply`],
//! which translates a [`Command`] into state changes and reports what happened
//! as [`Event`] values. Read access goes through the [`query`] module.

mod attackers;
mod damage;
mod defenders;
pub mod economy;
pub mod path;
mod projectiles;

use std::time::Duration;

use lane_defence_core::{
    AttackerId, Command, ConfigError, DamageType, DefenderId, DefenderKind, Event, MatchOutcome,
    PersistedState, PlacementRejection, Playfield, TargetingStrategy, UpgradeRejection,
    ValidatedLevel, Vec2, WaveId, MAX_LEVEL, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

use crate::{
    attackers::AttackerRegistry,
    defenders::DefenderRegistry,
    economy::Ledger,
    path::Path,
    projectiles::{Flight, Launch, ProjectileRegistry},
};

/// Represents the authoritative Lane Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    path: Path,
    playfield: Playfield,
    clock: Duration,
    attackers: AttackerRegistry,
    defenders: DefenderRegistry,
    projectiles: ProjectileRegistry,
    ledger: Ledger,
    lives: u32,
    wave: Option<WaveId>,
    outcome: MatchOutcome,
}

impl World {
    /// Creates a fresh world for the validated level.
    pub fn new(level: &ValidatedLevel) -> Result<Self, ConfigError> {
        let path = Path::new(level.waypoints.clone())?;
        Ok(Self {
            banner: WELCOME_BANNER,
            path,
            playfield: level.playfield,
            clock: Duration::ZERO,
            attackers: AttackerRegistry::new(),
            defenders: DefenderRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            ledger: Ledger::new(level.starting_gold),
            lives: level.starting_lives,
            wave: None,
            outcome: MatchOutcome::InProgress,
        })
    }

    /// Rebuilds a world from persisted economy, wave and defender state.
    ///
    /// Defenders come back with their level and strategy and with the
    /// investment their level implies. Nothing is charged to the ledger.
    /// A state that already finished every wave with lives left is a victory.
    pub fn from_persisted(
        level: &ValidatedLevel,
        state: &PersistedState,
    ) -> Result<Self, ConfigError> {
        let mut world = Self::new(level)?;
        world.ledger = Ledger::new(state.gold);
        world.lives = state.lives;
        world.wave = (state.wave_index > 0).then(|| WaveId::new(state.wave_index));
        if world.lives == 0 {
            world.outcome = MatchOutcome::Defeat;
        } else if state.wave_index >= level.total_waves {
            world.outcome = MatchOutcome::Victory;
        }

        for defender in &state.defenders {
            if !(1..=MAX_LEVEL).contains(&defender.level) {
                return Err(ConfigError::InvalidLevel(defender.level));
            }
            let _ = world.defenders.insert(
                defender.kind,
                Vec2::from(defender.position),
                defender.level,
                defender.strategy,
                defender.kind.cumulative_cost(defender.level),
            );
        }

        info!(
            gold = state.gold,
            lives = state.lives,
            defenders = state.defenders.len(),
            "world restored"
        );
        Ok(world)
    }

    fn is_over(&self) -> bool {
        self.outcome != MatchOutcome::InProgress
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if world.is_over() {
                return;
            }
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            advance_attackers(world, dt, out_events);
        }
        Command::SpawnAttacker { kind, wave } => {
            if world.is_over() {
                return;
            }
            let attacker = world.attackers.spawn(kind, wave, &world.path);
            debug!(attacker = attacker.get(), kind = kind.identifier(), wave = wave.get(), "attacker spawned");
            out_events.push(Event::AttackerSpawned {
                attacker,
                kind,
                wave,
            });
        }
        Command::PlaceDefender { kind, position } => {
            place_defender(world, kind, position, out_events);
        }
        Command::UpgradeDefender { defender } => upgrade_defender(world, defender, out_events),
        Command::SellDefender { defender } => {
            let Some(sold) = world.defenders.remove(defender) else {
                warn!(defender = defender.get(), "sale of unknown defender");
                out_events.push(Event::SaleRejected { defender });
                return;
            };
            let refund = DefenderKind::refund_for(sold.total_spent);
            world.ledger.credit(refund);
            debug!(defender = defender.get(), refund, "defender sold");
            out_events.push(Event::DefenderSold { defender, refund });
        }
        Command::SetTargetingStrategy { defender, strategy } => {
            set_strategy(world, defender, strategy, out_events);
        }
        Command::FireProjectile {
            defender,
            target,
            buff,
        } => fire_projectile(world, defender, target, buff, out_events),
        Command::AdvanceProjectiles { dt } => {
            if world.is_over() {
                return;
            }
            advance_projectiles(world, dt, out_events);
        }
        Command::PruneRemoved => {
            for attacker in world.attackers.prune_removed() {
                out_events.push(Event::AttackerRemoved { attacker });
            }
            world.projectiles.prune_finished();
        }
        Command::BeginWave { wave } => {
            if world.is_over() {
                return;
            }
            world.wave = Some(wave);
            info!(wave = wave.get(), "wave started");
            out_events.push(Event::WaveStarted { wave });
        }
        Command::CompleteWave {
            wave,
            reward,
            final_wave,
        } => {
            if world.is_over() {
                return;
            }
            world.ledger.credit(reward);
            info!(wave = wave.get(), reward, gold = world.ledger.balance(), "wave completed");
            out_events.push(Event::WaveCompleted { wave, reward });
            if final_wave {
                world.outcome = MatchOutcome::Victory;
                info!(lives = world.lives, "all waves cleared");
                out_events.push(Event::AllWavesCleared);
            }
        }
    }
}

fn advance_attackers(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let mut lives_lost: u32 = 0;
    let mut settled = Vec::new();

    for attacker in world.attackers.iter_mut() {
        let report = attacker.update(dt, &world.path);
        if report.activated {
            out_events.push(Event::AttackerActivated {
                attacker: attacker.id,
            });
        }
        if let Some(outcome) = report.status_damage {
            settled.push((attacker.id, outcome));
        }
        if report.leaked {
            lives_lost = lives_lost.saturating_add(attacker.lives_cost);
            debug!(attacker = attacker.id.get(), lives = attacker.lives_cost, "attacker leaked");
            out_events.push(Event::AttackerLeaked {
                attacker: attacker.id,
                lives_lost: attacker.lives_cost,
            });
        }
    }

    for (attacker, outcome) in settled {
        damage::settle(
            &world.attackers,
            &mut world.ledger,
            attacker,
            outcome,
            DamageType::Magic,
            out_events,
        );
    }

    if lives_lost == 0 {
        return;
    }
    world.lives = world.lives.saturating_sub(lives_lost);
    if world.lives == 0 {
        world.outcome = MatchOutcome::Defeat;
        warn!(clock = ?world.clock, "lives exhausted");
        out_events.push(Event::Defeated);
    }
}

fn place_defender(
    world: &mut World,
    kind: DefenderKind,
    position: Vec2,
    out_events: &mut Vec<Event>,
) {
    let rejection = if world.is_over() {
        Some(PlacementRejection::MatchOver)
    } else if !position.is_finite() || !world.playfield.contains(position) {
        Some(PlacementRejection::InvalidPlacement)
    } else if !world.ledger.spend(kind.profile().cost) {
        Some(PlacementRejection::InsufficientFunds)
    } else {
        None
    };

    if let Some(reason) = rejection {
        warn!(kind = kind.identifier(), ?position, %reason, "placement rejected");
        out_events.push(Event::PlacementRejected {
            kind,
            position,
            reason,
        });
        return;
    }

    let profile = kind.profile();
    let defender = world
        .defenders
        .insert(kind, position, 1, profile.strategy, profile.cost);
    debug!(defender = defender.get(), kind = kind.identifier(), ?position, "defender placed");
    out_events.push(Event::DefenderPlaced {
        defender,
        kind,
        position,
    });
}

fn upgrade_defender(world: &mut World, id: DefenderId, out_events: &mut Vec<Event>) {
    let rejection = match world.defenders.get_mut(id) {
        None => Some(UpgradeRejection::UnknownDefender),
        Some(defender) if defender.level >= MAX_LEVEL => Some(UpgradeRejection::AlreadyAtMaxLevel),
        Some(defender) => {
            let cost = defender.kind.upgrade_cost(defender.level);
            if world.ledger.spend(cost) {
                defender.level_up(cost);
                debug!(defender = id.get(), level = defender.level, cost, "defender upgraded");
                out_events.push(Event::DefenderUpgraded {
                    defender: id,
                    level: defender.level,
                    cost,
                });
                None
            } else {
                Some(UpgradeRejection::InsufficientFunds)
            }
        }
    };

    if let Some(reason) = rejection {
        warn!(defender = id.get(), %reason, "upgrade rejected");
        out_events.push(Event::UpgradeRejected {
            defender: id,
            reason,
        });
    }
}

fn set_strategy(
    world: &mut World,
    id: DefenderId,
    strategy: TargetingStrategy,
    out_events: &mut Vec<Event>,
) {
    let Some(defender) = world.defenders.get_mut(id) else {
        warn!(defender = id.get(), "strategy change for unknown defender");
        return;
    };
    defender.strategy = strategy;
    out_events.push(Event::TargetingStrategyChanged {
        defender: id,
        strategy,
    });
}

fn fire_projectile(
    world: &mut World,
    id: DefenderId,
    target: AttackerId,
    buff: f32,
    out_events: &mut Vec<Event>,
) {
    if world.is_over() {
        return;
    }
    let Some(defender) = world.defenders.get_mut(id) else {
        return;
    };
    if defender.kind.is_support() || world.clock < defender.cooldown_until {
        return;
    }
    if defender.stats.fire_rate <= 0.0 {
        return;
    }
    let Some(target_position) = world
        .attackers
        .get(target)
        .filter(|attacker| attacker.state.is_active())
        .map(|attacker| attacker.position)
    else {
        return;
    };

    let damage = defender.stats.damage * (1.0 + buff.max(0.0));
    defender.cooldown_until = world
        .clock
        .saturating_add(Duration::from_secs_f32(1.0 / defender.stats.fire_rate));
    let projectile = world.projectiles.launch(Launch {
        defender: id,
        origin: defender.position,
        target,
        target_position,
        damage,
        speed: defender.kind.profile().projectile_speed,
        effect: defender.kind.special_effect(defender.level),
    });
    out_events.push(Event::ProjectileFired {
        projectile,
        defender: id,
        target,
    });
}

fn advance_projectiles(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    for projectile in world.projectiles.iter_mut() {
        match projectile.step(dt, &world.attackers, &world.playfield) {
            Flight::InFlight => {}
            Flight::Hit(target) => {
                out_events.push(Event::ProjectileHit {
                    projectile: projectile.id,
                    target,
                });
                damage::resolve_hit(
                    &mut world.attackers,
                    &mut world.ledger,
                    target,
                    projectile.damage,
                    projectile.effect,
                    out_events,
                );
            }
            Flight::Missed => {
                out_events.push(Event::ProjectileMissed {
                    projectile: projectile.id,
                });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use lane_defence_core::{AttackerView, DefenderView, MatchOutcome, ProjectileSnapshot, WaveId};

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Simulation time accumulated by every applied tick.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Captures a read-only view of every attacker.
    #[must_use]
    pub fn attacker_view(world: &World) -> AttackerView {
        AttackerView::from_snapshots(
            world
                .attackers
                .iter()
                .map(|attacker| attacker.snapshot())
                .collect(),
        )
    }

    /// Captures a read-only view of every defender.
    #[must_use]
    pub fn defender_view(world: &World) -> DefenderView {
        DefenderView::from_snapshots(
            world
                .defenders
                .iter()
                .map(|defender| defender.snapshot())
                .collect(),
        )
    }

    /// Snapshots of every projectile still in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u64 {
        world.ledger.balance()
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveId> {
        world.wave
    }

    /// Match outcome so far.
    #[must_use]
    pub fn outcome(world: &World) -> MatchOutcome {
        world.outcome
    }
}
