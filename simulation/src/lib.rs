#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic Lane Defence simulation.
//!
//! [`Simulation`] owns the authoritative world and the pure systems and runs
//! them in a fixed order every tick:
//!
//! 0. the wave scheduler releases due spawns;
//! 1. attackers tick their statuses and move;
//! 2. defenders pick targets and fire;
//! 3. projectiles move and resolve hits;
//! 4. removed attackers and finished projectiles are pruned;
//! 5. wave completion is checked.
//!
//! Identical command scripts always produce identical states, which
//! [`Simulation::state_digest`] makes cheap to compare.

use std::time::Duration;

use lane_defence_core::{
    AttackerId, AttackerKind, AttackerView, Command, ConfigError, DefenderId, DefenderKind,
    DefenderTarget, DefenderView, Event, LevelConfig, MatchOutcome, PersistedDefender,
    PersistedState, PlacementRejection, PlacementValidator, ProjectileSnapshot,
    TargetingStrategy, UpgradeRejection, Vec2, WaveId, WaveProgress, WaveStatus,
};
use lane_defence_system_defender_combat::DefenderCombat;
use lane_defence_system_targeting::DefenderTargeting;
use lane_defence_system_wave_scheduler::WaveScheduler;
use lane_defence_world::{self as world, query, World};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Fastest speed a host may request.
pub const MAX_SPEED_MULTIPLIER: f32 = 100.0;

/// Owns the world, the systems and the time controls of a single match.
pub struct Simulation {
    world: World,
    scheduler: WaveScheduler,
    targeting: DefenderTargeting,
    combat: DefenderCombat,
    validator: Box<dyn PlacementValidator>,
    paused: bool,
    speed_multiplier: f32,
    events: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<DefenderTarget>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("scheduler", &self.scheduler)
            .field("paused", &self.paused)
            .field("speed_multiplier", &self.speed_multiplier)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation for the provided level.
    pub fn new(
        config: &LevelConfig,
        validator: impl PlacementValidator + 'static,
    ) -> Result<Self, ConfigError> {
        let level = config.validate()?;
        let world = World::new(&level)?;
        info!(
            waypoints = level.waypoints.len(),
            gold = level.starting_gold,
            lives = level.starting_lives,
            waves = level.total_waves,
            "simulation created"
        );
        Ok(Self::assemble(
            world,
            WaveScheduler::new(level.total_waves),
            Box::new(validator),
        ))
    }

    /// Recreates a simulation from persisted state.
    ///
    /// The next wave started is the one after `state.wave_index`.
    pub fn restore(
        config: &LevelConfig,
        state: &PersistedState,
        validator: impl PlacementValidator + 'static,
    ) -> Result<Self, ConfigError> {
        let level = config.validate()?;
        let world = World::from_persisted(&level, state)?;
        Ok(Self::assemble(
            world,
            WaveScheduler::resume(level.total_waves, state.wave_index),
            Box::new(validator),
        ))
    }

    fn assemble(
        world: World,
        scheduler: WaveScheduler,
        validator: Box<dyn PlacementValidator>,
    ) -> Self {
        Self {
            world,
            scheduler,
            targeting: DefenderTargeting::new(),
            combat: DefenderCombat::new(),
            validator,
            paused: false,
            speed_multiplier: 1.0,
            events: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Applies `command` and returns the events it produced.
    fn execute(&mut self, command: Command) -> &[Event] {
        let start = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        &self.events[start..]
    }

    fn flush_commands(&mut self) {
        let mut commands = std::mem::take(&mut self.commands);
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        self.commands = commands;
    }

    /// Spawns an attacker at the start of the path outside the wave schedule.
    ///
    /// Returns `None` once the match is over.
    pub fn spawn_attacker(&mut self, kind: AttackerKind, wave: WaveId) -> Option<AttackerId> {
        self.execute(Command::SpawnAttacker { kind, wave })
            .iter()
            .find_map(|event| match event {
                Event::AttackerSpawned { attacker, .. } => Some(*attacker),
                _ => None,
            })
    }

    /// Places a defender after consulting the placement validator.
    pub fn place_defender(
        &mut self,
        kind: DefenderKind,
        position: Vec2,
    ) -> Result<DefenderId, PlacementRejection> {
        if query::outcome(&self.world) == MatchOutcome::InProgress
            && !self
                .validator
                .is_valid(kind, position, &query::defender_view(&self.world))
        {
            let reason = PlacementRejection::InvalidPlacement;
            warn!(kind = kind.identifier(), ?position, %reason, "placement rejected");
            self.events.push(Event::PlacementRejected {
                kind,
                position,
                reason,
            });
            return Err(reason);
        }

        let outcome = self
            .execute(Command::PlaceDefender { kind, position })
            .iter()
            .find_map(|event| match event {
                Event::DefenderPlaced { defender, .. } => Some(Ok(*defender)),
                Event::PlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            });
        outcome.unwrap_or(Err(PlacementRejection::InvalidPlacement))
    }

    /// Upgrades a defender, returning its new level.
    pub fn upgrade_defender(&mut self, defender: DefenderId) -> Result<u8, UpgradeRejection> {
        let outcome = self
            .execute(Command::UpgradeDefender { defender })
            .iter()
            .find_map(|event| match event {
                Event::DefenderUpgraded { level, .. } => Some(Ok(*level)),
                Event::UpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            });
        outcome.unwrap_or(Err(UpgradeRejection::UnknownDefender))
    }

    /// Sells a defender, returning the refund credited to the ledger.
    pub fn sell_defender(&mut self, defender: DefenderId) -> Option<u64> {
        self.execute(Command::SellDefender { defender })
            .iter()
            .find_map(|event| match event {
                Event::DefenderSold { refund, .. } => Some(*refund),
                _ => None,
            })
    }

    /// Changes the targeting strategy of a defender.
    pub fn set_targeting_strategy(
        &mut self,
        defender: DefenderId,
        strategy: TargetingStrategy,
    ) -> bool {
        self.execute(Command::SetTargetingStrategy { defender, strategy })
            .iter()
            .any(|event| matches!(event, Event::TargetingStrategyChanged { .. }))
    }

    /// Starts the next wave. Returns `false` and logs the reason when a wave
    /// is still running, every wave was played or the match is over.
    pub fn start_next_wave(&mut self) -> bool {
        if query::outcome(&self.world) != MatchOutcome::InProgress {
            warn!("wave start requested after the match ended");
            return false;
        }

        match self.scheduler.try_start_next(&mut self.commands) {
            Ok(wave) => {
                debug!(wave = wave.get(), "wave start accepted");
                self.flush_commands();
                true
            }
            Err(reason) => {
                warn!(%reason, "wave start rejected");
                false
            }
        }
    }

    /// Advances the match by `dt` scaled by the speed multiplier.
    ///
    /// Paused simulations and finished matches ignore ticks.
    pub fn tick(&mut self, dt: Duration) {
        if self.paused || query::outcome(&self.world) != MatchOutcome::InProgress {
            return;
        }
        let dt = Duration::try_from_secs_f64(f64::from(self.speed_multiplier) * dt.as_secs_f64())
            .unwrap_or(Duration::MAX);

        self.scheduler.handle(dt, &mut self.commands);
        self.flush_commands();

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let now = query::clock(&self.world);
        let defenders = query::defender_view(&self.world);
        let attackers = query::attacker_view(&self.world);
        self.targeting
            .handle(now, &defenders, &attackers, &mut self.targets);
        self.combat
            .handle(now, &defenders, &self.targets, &mut self.commands);
        self.flush_commands();

        world::apply(
            &mut self.world,
            Command::AdvanceProjectiles { dt },
            &mut self.events,
        );
        world::apply(&mut self.world, Command::PruneRemoved, &mut self.events);

        let attackers = query::attacker_view(&self.world);
        self.scheduler
            .check_completion(&attackers, &mut self.commands);
        self.flush_commands();

        match query::outcome(&self.world) {
            MatchOutcome::InProgress => {}
            MatchOutcome::Victory => info!(
                gold = query::gold(&self.world),
                lives = query::lives(&self.world),
                "match won"
            ),
            MatchOutcome::Defeat => info!(clock = ?now, "match lost"),
        }
    }

    /// Freezes every timer.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes from the frozen timers.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Reports whether the simulation is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the factor applied to every tick's `dt`. Rejects values outside
    /// `(0, MAX_SPEED_MULTIPLIER]`.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) -> bool {
        if !(multiplier > 0.0 && multiplier <= MAX_SPEED_MULTIPLIER) {
            warn!(multiplier, "speed multiplier rejected");
            return false;
        }
        self.speed_multiplier = multiplier;
        true
    }

    /// Factor applied to every tick's `dt`.
    #[must_use]
    pub const fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    /// Snapshot of every attacker.
    #[must_use]
    pub fn attackers(&self) -> AttackerView {
        query::attacker_view(&self.world)
    }

    /// Snapshot of every defender.
    #[must_use]
    pub fn defenders(&self) -> DefenderView {
        query::defender_view(&self.world)
    }

    /// Snapshot of every projectile in flight.
    #[must_use]
    pub fn projectiles(&self) -> Vec<ProjectileSnapshot> {
        query::projectiles(&self.world)
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(&self) -> u64 {
        query::gold(&self.world)
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub fn clock(&self) -> Duration {
        query::clock(&self.world)
    }

    /// Wave progression snapshot.
    #[must_use]
    pub fn wave_progress(&self) -> WaveProgress {
        self.scheduler.progress()
    }

    /// Result of the match so far.
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        query::outcome(&self.world)
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Takes every event produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// State handed to the persistence collaborator.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            gold: self.gold(),
            lives: self.lives(),
            wave_index: self.last_finished_wave(),
            defenders: self
                .defenders()
                .iter()
                .map(|defender| PersistedDefender {
                    kind: defender.kind,
                    position: defender.position.to_array(),
                    level: defender.level,
                    strategy: defender.strategy,
                })
                .collect(),
        }
    }

    /// Highest wave that ran to completion. A wave cut off mid-flight is
    /// replayed on restore, so it does not count.
    fn last_finished_wave(&self) -> u32 {
        let progress = self.scheduler.progress();
        let last_started = progress.wave.map_or(0, |wave| wave.get());
        match progress.status {
            WaveStatus::InProgress => last_started.saturating_sub(1),
            WaveStatus::Idle | WaveStatus::Exhausted => last_started,
        }
    }

    /// SHA-256 over the authoritative state.
    ///
    /// Two simulations fed the same script produce the same digest.
    #[must_use]
    pub fn state_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.clock().as_nanos().to_le_bytes());
        hasher.update(self.gold().to_le_bytes());
        hasher.update(self.lives().to_le_bytes());
        hasher.update([outcome_tag(self.outcome())]);

        let progress = self.wave_progress();
        hasher.update(progress.wave.map_or(0, |wave| wave.get()).to_le_bytes());
        hasher.update(progress.spawned.to_le_bytes());

        for attacker in self.attackers().iter() {
            hasher.update(attacker.id.get().to_le_bytes());
            hasher.update(attacker.kind.identifier().as_bytes());
            hasher.update([attacker.state as u8]);
            hash_vec(&mut hasher, attacker.position);
            hasher.update(attacker.hp.to_bits().to_le_bytes());
            hasher.update(attacker.progress.to_bits().to_le_bytes());
        }

        for defender in self.defenders().iter() {
            hasher.update(defender.id.get().to_le_bytes());
            hasher.update(defender.kind.identifier().as_bytes());
            hash_vec(&mut hasher, defender.position);
            hasher.update([defender.level]);
            hasher.update(defender.cooldown_until.as_nanos().to_le_bytes());
            hasher.update(defender.total_spent.to_le_bytes());
        }

        for projectile in self.projectiles() {
            hasher.update(projectile.id.get().to_le_bytes());
            hash_vec(&mut hasher, projectile.position);
        }

        hasher.finalize().into()
    }
}

fn hash_vec(hasher: &mut Sha256, value: Vec2) {
    hasher.update(value.x.to_bits().to_le_bytes());
    hasher.update(value.y.to_bits().to_le_bytes());
}

const fn outcome_tag(outcome: MatchOutcome) -> u8 {
    match outcome {
        MatchOutcome::InProgress => 0,
        MatchOutcome::Victory => 1,
        MatchOutcome::Defeat => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_field(_: DefenderKind, _: Vec2, _: &DefenderView) -> bool {
        true
    }

    fn config() -> LevelConfig {
        LevelConfig {
            waypoints: vec![[0.0, 0.0], [300.0, 0.0]],
            playfield: None,
            starting_gold: 200,
            starting_lives: 5,
            total_waves: 2,
        }
    }

    #[test]
    fn speed_multiplier_rejects_values_outside_the_supported_range() {
        let mut simulation = Simulation::new(&config(), open_field).expect("simulation");
        for multiplier in [0.0, -2.0, f32::NAN, f32::INFINITY, 1e30, MAX_SPEED_MULTIPLIER * 2.0] {
            assert!(
                !simulation.set_speed_multiplier(multiplier),
                "{multiplier} was accepted"
            );
        }
        assert_eq!(simulation.speed_multiplier(), 1.0);
        assert!(simulation.set_speed_multiplier(2.0));
        assert_eq!(simulation.speed_multiplier(), 2.0);
    }

    #[test]
    fn fastest_speed_with_huge_ticks_saturates_the_clock() {
        let mut simulation = Simulation::new(&config(), open_field).expect("simulation");
        assert!(simulation.set_speed_multiplier(MAX_SPEED_MULTIPLIER));
        simulation.tick(Duration::from_secs(u64::MAX / 2));
        assert_eq!(simulation.clock(), Duration::MAX);
        simulation.tick(Duration::from_secs(1));
        assert_eq!(simulation.clock(), Duration::MAX);
    }

    #[test]
    fn speed_multiplier_scales_the_clock() {
        let mut simulation = Simulation::new(&config(), open_field).expect("simulation");
        assert!(simulation.set_speed_multiplier(2.0));
        simulation.tick(Duration::from_millis(100));
        assert_eq!(simulation.clock(), Duration::from_millis(200));
    }

    #[test]
    fn outcome_tags_are_distinct() {
        assert_ne!(
            outcome_tag(MatchOutcome::InProgress),
            outcome_tag(MatchOutcome::Victory)
        );
        assert_ne!(
            outcome_tag(MatchOutcome::Victory),
            outcome_tag(MatchOutcome::Defeat)
        );
    }

    #[test]
    fn drain_events_empties_the_queue() {
        let mut simulation = Simulation::new(&config(), open_field).expect("simulation");
        simulation.tick(Duration::from_millis(10));
        assert!(!simulation.drain_events().is_empty());
        assert!(simulation.drain_events().is_empty());
    }
}
