//! Authoritative defender state management utilities.

use std::{collections::BTreeMap, time::Duration};

use lane_defence_core::{
    DefenderId, DefenderKind, DefenderSnapshot, DefenderStats, TargetingStrategy, Vec2, MAX_LEVEL,
};

/// Defender stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Defender {
    pub(crate) id: DefenderId,
    pub(crate) kind: DefenderKind,
    pub(crate) position: Vec2,
    pub(crate) level: u8,
    pub(crate) stats: DefenderStats,
    pub(crate) cooldown_until: Duration,
    pub(crate) strategy: TargetingStrategy,
    pub(crate) total_spent: u64,
}

impl Defender {
    /// Raises the level by one and refreshes the derived stats.
    pub(crate) fn level_up(&mut self, cost: u64) {
        debug_assert!(self.level < MAX_LEVEL, "level_up past the last level");
        self.level += 1;
        self.stats = self.kind.stats_at(self.level);
        self.total_spent = self.total_spent.saturating_add(cost);
    }

    pub(crate) fn snapshot(&self) -> DefenderSnapshot {
        DefenderSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            level: self.level,
            stats: self.stats,
            cooldown_until: self.cooldown_until,
            strategy: self.strategy,
            total_spent: self.total_spent,
        }
    }
}

/// Registry that stores defenders and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct DefenderRegistry {
    entries: BTreeMap<DefenderId, Defender>,
    next_defender_id: DefenderId,
}

impl DefenderRegistry {
    /// Creates an empty defender registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_defender_id: DefenderId::new(0),
        }
    }

    /// Inserts a defender at `level`, recording `total_spent` as its investment.
    pub(crate) fn insert(
        &mut self,
        kind: DefenderKind,
        position: Vec2,
        level: u8,
        strategy: TargetingStrategy,
        total_spent: u64,
    ) -> DefenderId {
        let id = self.next_defender_id;
        self.next_defender_id = DefenderId::new(id.get().saturating_add(1));
        let defender = Defender {
            id,
            kind,
            position,
            level,
            stats: kind.stats_at(level),
            cooldown_until: Duration::ZERO,
            strategy,
            total_spent,
        };
        let _ = self.entries.insert(id, defender);
        id
    }

    pub(crate) fn get_mut(&mut self, id: DefenderId) -> Option<&mut Defender> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: DefenderId) -> Option<Defender> {
        self.entries.remove(&id)
    }

    /// Defenders in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Defender> {
        self.entries.values()
    }
}
