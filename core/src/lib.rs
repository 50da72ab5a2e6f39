#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume immutable views such as
//! [`AttackerView`] and [`DefenderView`] and respond exclusively with new
//! command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod config;
mod effects;
mod kinds;

pub use config::{ConfigError, LevelConfig, Playfield, PlayfieldConfig, ValidatedLevel};
pub use effects::{DamageType, SpecialEffect, StatusEffect, StatusEffects, StatusKind};
pub use kinds::{
    armor_bonus_for_wave, hp_multiplier_for_wave, resist_bonus_for_wave, AttackerKind,
    AttackerStats, DefenderKind, DefenderProfile, DefenderStats, AURA_DAMAGE_PER_LEVEL,
    BOSS_WAVE_INTERVAL, MAX_LEVEL, RESIST_CAP, SELL_REFUND_PERCENT,
};

/// Two dimensional vector used for every position and heading in the engine.
pub use glam::Vec2;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Lane Defence.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and every attacker by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new attacker enters the path.
    SpawnAttacker {
        /// Kind of attacker to create.
        kind: AttackerKind,
        /// Wave whose scaling rules apply to the attacker's stats.
        wave: WaveId,
    },
    /// Requests placement of a defender at the provided position.
    PlaceDefender {
        /// Type of defender to construct.
        kind: DefenderKind,
        /// World position the defender occupies.
        position: Vec2,
    },
    /// Requests that a defender advances to its next level.
    UpgradeDefender {
        /// Identifier of the defender to upgrade.
        defender: DefenderId,
    },
    /// Requests that a defender is sold for a partial refund.
    SellDefender {
        /// Identifier of the defender to sell.
        defender: DefenderId,
    },
    /// Changes the strategy a defender uses to pick targets.
    SetTargetingStrategy {
        /// Identifier of the defender to reconfigure.
        defender: DefenderId,
        /// Strategy the defender should use from now on.
        strategy: TargetingStrategy,
    },
    /// Requests that a ready defender fires a projectile at an attacker.
    FireProjectile {
        /// Defender that fires.
        defender: DefenderId,
        /// Attacker the projectile homes in on.
        target: AttackerId,
        /// Additive damage bonus granted by support auras this tick.
        buff: f32,
    },
    /// Moves every projectile and resolves contacts.
    AdvanceProjectiles {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Drops removed attackers and terminated projectiles from the registries.
    PruneRemoved,
    /// Records that a wave started spawning.
    BeginWave {
        /// Wave that started.
        wave: WaveId,
    },
    /// Records that a wave finished and pays its completion reward.
    CompleteWave {
        /// Wave that completed.
        wave: WaveId,
        /// Gold credited for clearing the wave.
        reward: u64,
        /// Indicates whether the wave was the final scheduled wave.
        final_wave: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an attacker was created at the start of the path.
    AttackerSpawned {
        /// Identifier assigned to the attacker.
        attacker: AttackerId,
        /// Kind of the attacker.
        kind: AttackerKind,
        /// Wave that produced the attacker.
        wave: WaveId,
    },
    /// Reports that an attacker finished its setup tick and became targetable.
    AttackerActivated {
        /// Identifier of the attacker.
        attacker: AttackerId,
    },
    /// Reports damage dealt to an attacker after mitigation.
    AttackerDamaged {
        /// Identifier of the damaged attacker.
        attacker: AttackerId,
        /// Effective damage subtracted from the attacker's health.
        amount: f32,
        /// Damage channel used for mitigation.
        damage_type: DamageType,
    },
    /// Reports that a status effect was attached to or merged into an attacker.
    StatusApplied {
        /// Identifier of the affected attacker.
        attacker: AttackerId,
        /// Kind of status that was applied.
        kind: StatusKind,
    },
    /// Reports that an attacker ran out of health and started dying.
    AttackerKilled {
        /// Identifier of the attacker.
        attacker: AttackerId,
        /// Gold credited for the kill.
        reward: u64,
    },
    /// Reports that an attacker reached the end of the path.
    AttackerLeaked {
        /// Identifier of the attacker.
        attacker: AttackerId,
        /// Lives deducted for the leak.
        lives_lost: u32,
    },
    /// Reports that an attacker was dropped from the registry.
    AttackerRemoved {
        /// Identifier of the attacker.
        attacker: AttackerId,
    },
    /// Confirms that a defender was placed.
    DefenderPlaced {
        /// Identifier allocated to the defender.
        defender: DefenderId,
        /// Kind of the defender.
        kind: DefenderKind,
        /// Position the defender occupies.
        position: Vec2,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Kind of defender requested.
        kind: DefenderKind,
        /// Requested position.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementRejection,
    },
    /// Confirms that a defender reached a new level.
    DefenderUpgraded {
        /// Identifier of the defender.
        defender: DefenderId,
        /// Level reached by the upgrade.
        level: u8,
        /// Gold spent on the upgrade.
        cost: u64,
    },
    /// Reports that an upgrade request was rejected.
    UpgradeRejected {
        /// Identifier of the defender.
        defender: DefenderId,
        /// Specific reason the upgrade failed.
        reason: UpgradeRejection,
    },
    /// Confirms that a defender was sold.
    DefenderSold {
        /// Identifier of the sold defender.
        defender: DefenderId,
        /// Gold credited back to the ledger.
        refund: u64,
    },
    /// Reports that a sale targeted a defender that does not exist.
    SaleRejected {
        /// Identifier named in the request.
        defender: DefenderId,
    },
    /// Confirms that a defender switched targeting strategy.
    TargetingStrategyChanged {
        /// Identifier of the defender.
        defender: DefenderId,
        /// Strategy now in use.
        strategy: TargetingStrategy,
    },
    /// Confirms that a projectile left a defender.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Defender that fired.
        defender: DefenderId,
        /// Attacker the projectile tracks.
        target: AttackerId,
    },
    /// Reports that a projectile made contact with its target.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Attacker that was hit.
        target: AttackerId,
    },
    /// Reports that a projectile lost its target or left the playfield.
    ProjectileMissed {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// Wave that started.
        wave: WaveId,
    },
    /// Announces that a wave was cleared.
    WaveCompleted {
        /// Wave that completed.
        wave: WaveId,
        /// Gold credited for the wave.
        reward: u64,
    },
    /// Announces that the final wave was cleared.
    AllWavesCleared,
    /// Announces that the lives pool ran out.
    Defeated,
}

/// Unique identifier assigned to an attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttackerId(u32);

impl AttackerId {
    /// Creates a new attacker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenderId(u32);

impl DefenderId {
    /// Creates a new defender identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the defender identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based wave index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the identifier of the wave following this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Lifecycle of an attacker. Transitions only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttackerState {
    /// Single-tick setup directly after creation.
    Spawning,
    /// Moving along the path; damageable and targetable.
    Active,
    /// Out of health and waiting for removal.
    Dying,
    /// Terminal state; pruned at the end of the tick.
    Removed,
}

impl AttackerState {
    /// Reports whether defenders may select and damage the attacker.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Reports whether the attacker still counts toward wave completion.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Spawning | Self::Active)
    }
}

/// Rules a defender uses to choose between attackers in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingStrategy {
    /// Attacker with the greatest path progress.
    First,
    /// Attacker with the least path progress.
    Last,
    /// Attacker closest to the defender.
    Nearest,
    /// Attacker with the most remaining health.
    Strongest,
    /// Attacker with the least remaining health.
    Weakest,
}

impl std::str::FromStr for TargetingStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "nearest" => Ok(Self::Nearest),
            "strongest" => Ok(Self::Strongest),
            "weakest" => Ok(Self::Weakest),
            _ => Err(ConfigError::UnknownStrategy(value.to_owned())),
        }
    }
}

/// Reasons a defender placement request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementRejection {
    /// The map collaborator refused the position.
    #[error("position is not a valid placement")]
    InvalidPlacement,
    /// The ledger cannot cover the build cost.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// The match already ended.
    #[error("match is over")]
    MatchOver,
}

/// Reasons a defender upgrade request may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeRejection {
    /// No defender with the provided identifier exists.
    #[error("unknown defender")]
    UnknownDefender,
    /// The defender already reached its last level.
    #[error("defender is already at max level")]
    AlreadyAtMaxLevel,
    /// The ledger cannot cover the upgrade cost.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Reasons a wave cannot be started.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum WaveRejection {
    /// A wave is still spawning or has live attackers.
    #[error("a wave is already in progress")]
    WaveAlreadyInProgress,
    /// Every scheduled wave was played.
    #[error("all waves are exhausted")]
    AllWavesExhausted,
}

/// Immutable representation of a single attacker used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackerSnapshot {
    /// Unique identifier assigned to the attacker.
    pub id: AttackerId,
    /// Kind of the attacker.
    pub kind: AttackerKind,
    /// Wave that spawned the attacker.
    pub wave: WaveId,
    /// Current lifecycle state.
    pub state: AttackerState,
    /// Current world position.
    pub position: Vec2,
    /// Unit vector pointing along the current path segment.
    pub heading: Vec2,
    /// Fraction of the path travelled, in `[0, 1]`.
    pub progress: f32,
    /// Remaining health.
    pub hp: f32,
    /// Health the attacker spawned with.
    pub max_hp: f32,
}

impl AttackerSnapshot {
    /// Remaining health expressed as a fraction of maximum health.
    #[must_use]
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }
}

/// Read-only snapshot describing all attackers on the path.
#[derive(Clone, Debug, Default)]
pub struct AttackerView {
    snapshots: Vec<AttackerSnapshot>,
}

impl AttackerView {
    /// Creates a new attacker view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AttackerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured attacker snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single attacker.
    #[must_use]
    pub fn get(&self, id: AttackerId) -> Option<&AttackerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of attackers that still count toward wave completion.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.state.is_live())
            .count()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AttackerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single defender used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSnapshot {
    /// Identifier allocated to the defender by the world.
    pub id: DefenderId,
    /// Kind of the defender.
    pub kind: DefenderKind,
    /// World position of the defender.
    pub position: Vec2,
    /// Current level, starting at one.
    pub level: u8,
    /// Stats derived from the kind and level.
    pub stats: DefenderStats,
    /// Simulation time at which the defender may fire again.
    pub cooldown_until: Duration,
    /// Strategy used to pick targets.
    pub strategy: TargetingStrategy,
    /// Gold spent on construction and upgrades.
    pub total_spent: u64,
}

impl DefenderSnapshot {
    /// Reports whether the defender may fire at the provided time.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        now >= self.cooldown_until
    }
}

/// Read-only snapshot describing all defenders.
#[derive(Clone, Debug, Default)]
pub struct DefenderView {
    snapshots: Vec<DefenderSnapshot>,
}

impl DefenderView {
    /// Creates a new defender view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenderSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured defender snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DefenderSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single defender.
    #[must_use]
    pub fn get(&self, id: DefenderId) -> Option<&DefenderSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DefenderSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Defender that fired the projectile.
    pub defender: DefenderId,
    /// Current world position.
    pub position: Vec2,
    /// Attacker still being tracked, if any.
    pub tracking: Option<AttackerId>,
}

/// Target assignment computed for a ready defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefenderTarget {
    /// Defender that should fire.
    pub defender: DefenderId,
    /// Attacker the defender selected.
    pub attacker: AttackerId,
}

/// One group of identical spawns inside a wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Kind spawned by the group.
    pub kind: AttackerKind,
    /// Number of attackers in the group.
    pub count: u32,
    /// Delay between consecutive spawns of the group.
    pub spawn_interval: Duration,
}

/// Composition of a single wave. Immutable once generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    index: WaveId,
    groups: Vec<SpawnGroup>,
    completion_reward: u64,
}

impl Wave {
    /// Creates a wave from its groups and reward.
    #[must_use]
    pub fn new(index: WaveId, groups: Vec<SpawnGroup>, completion_reward: u64) -> Self {
        Self {
            index,
            groups,
            completion_reward,
        }
    }

    /// Index of the wave.
    #[must_use]
    pub const fn index(&self) -> WaveId {
        self.index
    }

    /// Spawn groups in the order they are released.
    #[must_use]
    pub fn groups(&self) -> &[SpawnGroup] {
        &self.groups
    }

    /// Gold credited once the wave is cleared.
    #[must_use]
    pub const fn completion_reward(&self) -> u64 {
        self.completion_reward
    }

    /// Total number of attackers the wave spawns.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// State of the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveStatus {
    /// Waiting for the next wave to be started.
    Idle,
    /// A wave is spawning or still has live attackers.
    InProgress,
    /// Every scheduled wave was cleared.
    Exhausted,
}

/// Read-only snapshot of wave progression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// Most recently started wave, if any.
    pub wave: Option<WaveId>,
    /// Number of waves in the level.
    pub total_waves: u32,
    /// Current scheduler state.
    pub status: WaveStatus,
    /// Attackers spawned by the current wave so far.
    pub spawned: u32,
    /// Attackers the current wave spawns in total.
    pub total: u32,
}

/// Result of the match so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// The match is still running.
    InProgress,
    /// Every wave was cleared with lives remaining.
    Victory,
    /// The lives pool ran out.
    Defeat,
}

/// Flat state handed to the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Ledger balance.
    pub gold: u64,
    /// Lives remaining.
    pub lives: u32,
    /// Number of the last wave that was completed (zero before the first one).
    pub wave_index: u32,
    /// Defenders standing on the map.
    pub defenders: Vec<PersistedDefender>,
}

/// Defender entry captured by [`PersistedState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedDefender {
    /// Kind of the defender.
    pub kind: DefenderKind,
    /// World position of the defender.
    pub position: [f32; 2],
    /// Level of the defender.
    pub level: u8,
    /// Targeting strategy of the defender.
    pub strategy: TargetingStrategy,
}

/// Placement-validity check owned by the map collaborator.
pub trait PlacementValidator {
    /// Reports whether a defender of `kind` may stand at `position`.
    fn is_valid(&self, kind: DefenderKind, position: Vec2, defenders: &DefenderView) -> bool;
}

impl<F> PlacementValidator for F
where
    F: Fn(DefenderKind, Vec2, &DefenderView) -> bool,
{
    fn is_valid(&self, kind: DefenderKind, position: Vec2, defenders: &DefenderView) -> bool {
        self(kind, position, defenders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn attacker(id: u32, state: AttackerState) -> AttackerSnapshot {
        AttackerSnapshot {
            id: AttackerId::new(id),
            kind: AttackerKind::Grunt,
            wave: WaveId::new(1),
            state,
            position: Vec2::ZERO,
            heading: Vec2::X,
            progress: 0.0,
            hp: 25.0,
            max_hp: 50.0,
        }
    }

    #[test]
    fn persisted_state_round_trips_through_bincode() {
        let state = PersistedState {
            gold: 120,
            lives: 17,
            wave_index: 4,
            defenders: vec![PersistedDefender {
                kind: DefenderKind::Tesla,
                position: [32.0, 48.0],
                level: 3,
                strategy: TargetingStrategy::Strongest,
            }],
        };
        assert_round_trip(&state);
    }

    #[test]
    fn placement_rejection_round_trips_through_bincode() {
        assert_round_trip(&PlacementRejection::InsufficientFunds);
    }

    #[test]
    fn attacker_view_is_sorted_and_searchable() {
        let view = AttackerView::from_snapshots(vec![
            attacker(9, AttackerState::Active),
            attacker(2, AttackerState::Dying),
            attacker(5, AttackerState::Spawning),
        ]);

        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(
            view.get(AttackerId::new(5)).map(|snapshot| snapshot.state),
            Some(AttackerState::Spawning)
        );
        assert!(view.get(AttackerId::new(3)).is_none());
        assert_eq!(view.live_count(), 2);
    }

    #[test]
    fn hp_fraction_is_clamped() {
        let mut snapshot = attacker(1, AttackerState::Active);
        assert!((snapshot.hp_fraction() - 0.5).abs() < f32::EPSILON);
        snapshot.max_hp = 0.0;
        assert_eq!(snapshot.hp_fraction(), 0.0);
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            "Strongest".parse::<TargetingStrategy>().expect("parse"),
            TargetingStrategy::Strongest
        );
        assert_eq!(
            "closest".parse::<TargetingStrategy>(),
            Err(ConfigError::UnknownStrategy("closest".to_owned()))
        );
    }

    #[test]
    fn wave_total_counts_every_group() {
        let wave = Wave::new(
            WaveId::new(2),
            vec![
                SpawnGroup {
                    kind: AttackerKind::Grunt,
                    count: 4,
                    spawn_interval: Duration::from_millis(500),
                },
                SpawnGroup {
                    kind: AttackerKind::Runner,
                    count: 3,
                    spawn_interval: Duration::from_millis(300),
                },
            ],
            30,
        );
        assert_eq!(wave.total_count(), 7);
        assert_eq!(wave.index().next(), WaveId::new(3));
    }
}
