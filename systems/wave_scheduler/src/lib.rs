#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling system.
//!
//! Wave compositions are a pure function of the wave index. Once a wave is
//! started the scheduler releases its spawns on a fixed timeline and reports
//! completion when everything has spawned and no attacker of any wave is
//! still spawning or walking the path.

use std::time::Duration;

use lane_defence_core::{
    AttackerKind, AttackerView, Command, SpawnGroup, Wave, WaveId, WaveProgress, WaveRejection,
    WaveStatus, BOSS_WAVE_INTERVAL,
};

const BASE_INTERVAL_MS: u64 = 1_000;
const INTERVAL_STEP_MS: u64 = 30;
const MIN_INTERVAL_MS: u64 = 350;
const BOSS_INTERVAL: Duration = Duration::from_secs(3);

/// Reports whether `wave` uses the boss formula.
#[must_use]
pub fn is_boss_wave(wave: WaveId) -> bool {
    wave.get() > 0 && wave.get() % BOSS_WAVE_INTERVAL == 0
}

/// Builds the composition of `wave`.
///
/// Normal waves grow every group linearly with the index and unlock faster
/// and tougher kinds as the match progresses. Every fifth wave is a boss wave
/// led by overlords with an escort.
#[must_use]
pub fn generate_composition(wave: WaveId) -> Wave {
    let index = wave.get().max(1);
    let steps = u64::from(index - 1);
    let base_interval = Duration::from_millis(
        BASE_INTERVAL_MS
            .saturating_sub(INTERVAL_STEP_MS * steps)
            .max(MIN_INTERVAL_MS),
    );
    let fast_interval = base_interval * 3 / 5;

    if is_boss_wave(wave) {
        let groups = vec![
            SpawnGroup {
                kind: AttackerKind::Grunt,
                count: 4 + index,
                spawn_interval: fast_interval,
            },
            SpawnGroup {
                kind: AttackerKind::Brute,
                count: 2 * (index / BOSS_WAVE_INTERVAL),
                spawn_interval: base_interval,
            },
            SpawnGroup {
                kind: AttackerKind::Overlord,
                count: index / BOSS_WAVE_INTERVAL,
                spawn_interval: BOSS_INTERVAL,
            },
        ];
        return Wave::new(wave, groups, 50 + 10 * u64::from(index));
    }

    let mut groups = vec![SpawnGroup {
        kind: AttackerKind::Grunt,
        count: 6 + 2 * (index - 1),
        spawn_interval: base_interval,
    }];
    if index >= 3 {
        groups.push(SpawnGroup {
            kind: AttackerKind::Runner,
            count: index - 2,
            spawn_interval: fast_interval,
        });
    }
    if index >= 6 {
        groups.push(SpawnGroup {
            kind: AttackerKind::Brute,
            count: (index - 3) / 2,
            spawn_interval: base_interval,
        });
    }
    if index >= 7 {
        groups.push(SpawnGroup {
            kind: AttackerKind::Wraith,
            count: (index - 5) / 2,
            spawn_interval: base_interval,
        });
    }
    Wave::new(wave, groups, 20 + 5 * u64::from(index))
}

/// Spawn timestamps of `wave`, relative to the moment it starts.
///
/// Each group begins one interval after the previous group's last spawn.
#[must_use]
pub fn spawn_timeline(wave: &Wave) -> Vec<(Duration, AttackerKind)> {
    let mut timeline = Vec::with_capacity(wave.total_count() as usize);
    let mut at = Duration::ZERO;
    let mut previous_interval: Option<Duration> = None;
    for group in wave.groups().iter().filter(|group| group.count > 0) {
        if let Some(interval) = previous_interval {
            at = at.saturating_add(interval);
        }
        for spawn in 0..group.count {
            if spawn > 0 {
                at = at.saturating_add(group.spawn_interval);
            }
            timeline.push((at, group.kind));
        }
        previous_interval = Some(group.spawn_interval);
    }
    timeline
}

#[derive(Clone, Debug)]
struct ActiveWave {
    wave: Wave,
    timeline: Vec<(Duration, AttackerKind)>,
    elapsed: Duration,
    spawned: usize,
}

/// Pure system that starts waves, emits spawn commands and detects completion.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    total_waves: u32,
    last_started: u32,
    status: WaveStatus,
    active: Option<ActiveWave>,
}

impl WaveScheduler {
    /// Creates a scheduler for a level with `total_waves` waves.
    #[must_use]
    pub fn new(total_waves: u32) -> Self {
        Self::resume(total_waves, 0)
    }

    /// Creates a scheduler that continues after the completed wave
    /// `last_completed`. It is exhausted once that was the final wave.
    #[must_use]
    pub fn resume(total_waves: u32, last_completed: u32) -> Self {
        let status = if last_completed >= total_waves {
            WaveStatus::Exhausted
        } else {
            WaveStatus::Idle
        };
        Self {
            total_waves,
            last_started: last_completed,
            status,
            active: None,
        }
    }

    /// Current scheduler state.
    #[must_use]
    pub const fn status(&self) -> WaveStatus {
        self.status
    }

    /// Starts the next wave, emitting `Command::BeginWave` on success.
    pub fn try_start_next(&mut self, out: &mut Vec<Command>) -> Result<WaveId, WaveRejection> {
        match self.status {
            WaveStatus::InProgress => return Err(WaveRejection::WaveAlreadyInProgress),
            WaveStatus::Exhausted => return Err(WaveRejection::AllWavesExhausted),
            WaveStatus::Idle => {}
        }

        let wave_id = WaveId::new(self.last_started + 1);
        let wave = generate_composition(wave_id);
        let timeline = spawn_timeline(&wave);
        self.last_started = wave_id.get();
        self.status = WaveStatus::InProgress;
        self.active = Some(ActiveWave {
            wave,
            timeline,
            elapsed: Duration::ZERO,
            spawned: 0,
        });
        out.push(Command::BeginWave { wave: wave_id });
        Ok(wave_id)
    }

    /// Advances the spawn timeline by `dt` and emits the spawns that came due.
    pub fn handle(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.elapsed = active.elapsed.saturating_add(dt);
        let wave = active.wave.index();
        while let Some((at, kind)) = active.timeline.get(active.spawned).copied() {
            if at > active.elapsed {
                break;
            }
            out.push(Command::SpawnAttacker { kind, wave });
            active.spawned += 1;
        }
    }

    /// Completes the running wave once it spawned everything and `attackers`
    /// holds no live attacker, whichever wave spawned it. Emits
    /// `Command::CompleteWave`.
    pub fn check_completion(&mut self, attackers: &AttackerView, out: &mut Vec<Command>) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.spawned < active.timeline.len() || attackers.live_count() > 0 {
            return;
        }

        let wave = active.wave.index();
        let final_wave = wave.get() >= self.total_waves;
        out.push(Command::CompleteWave {
            wave,
            reward: active.wave.completion_reward(),
            final_wave,
        });
        self.active = None;
        self.status = if final_wave {
            WaveStatus::Exhausted
        } else {
            WaveStatus::Idle
        };
    }

    /// Read-only progress snapshot.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        let (spawned, total) = self.active.as_ref().map_or((0, 0), |active| {
            (
                u32::try_from(active.spawned).unwrap_or(u32::MAX),
                active.wave.total_count(),
            )
        });
        WaveProgress {
            wave: (self.last_started > 0).then(|| WaveId::new(self.last_started)),
            total_waves: self.total_waves,
            status: self.status,
            spawned,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::{AttackerId, AttackerSnapshot, AttackerState, Vec2};

    #[test]
    fn first_wave_is_six_grunts() {
        let wave = generate_composition(WaveId::new(1));
        assert_eq!(
            wave.groups(),
            &[SpawnGroup {
                kind: AttackerKind::Grunt,
                count: 6,
                spawn_interval: Duration::from_secs(1),
            }]
        );
        assert_eq!(wave.completion_reward(), 25);
    }

    #[test]
    fn composition_is_pure() {
        for index in 1..=20 {
            let wave = WaveId::new(index);
            assert_eq!(generate_composition(wave), generate_composition(wave));
        }
    }

    #[test]
    fn every_fifth_wave_brings_overlords() {
        for index in 1..=20 {
            let wave = generate_composition(WaveId::new(index));
            let overlords: u32 = wave
                .groups()
                .iter()
                .filter(|group| group.kind == AttackerKind::Overlord)
                .map(|group| group.count)
                .sum();
            if index % 5 == 0 {
                assert_eq!(overlords, index / 5, "wave {index}");
                assert_eq!(wave.completion_reward(), 50 + 10 * u64::from(index));
            } else {
                assert_eq!(overlords, 0, "wave {index}");
            }
        }
    }

    #[test]
    fn normal_waves_grow_with_index() {
        let mut previous = 0;
        for index in [1, 2, 3, 4, 6, 7, 8, 9] {
            let total = generate_composition(WaveId::new(index)).total_count();
            assert!(total > previous, "wave {index} did not grow");
            previous = total;
        }
    }

    #[test]
    fn spawn_interval_is_floored() {
        let wave = generate_composition(WaveId::new(40));
        assert_eq!(wave.groups()[0].spawn_interval, Duration::from_millis(350));
    }

    #[test]
    fn timeline_releases_groups_sequentially() {
        let wave = Wave::new(
            WaveId::new(1),
            vec![
                SpawnGroup {
                    kind: AttackerKind::Grunt,
                    count: 2,
                    spawn_interval: Duration::from_millis(500),
                },
                SpawnGroup {
                    kind: AttackerKind::Runner,
                    count: 2,
                    spawn_interval: Duration::from_millis(200),
                },
            ],
            10,
        );
        assert_eq!(
            spawn_timeline(&wave),
            vec![
                (Duration::ZERO, AttackerKind::Grunt),
                (Duration::from_millis(500), AttackerKind::Grunt),
                (Duration::from_millis(1_000), AttackerKind::Runner),
                (Duration::from_millis(1_200), AttackerKind::Runner),
            ]
        );
    }

    #[test]
    fn start_is_rejected_while_in_progress() {
        let mut scheduler = WaveScheduler::new(2);
        let mut out = Vec::new();
        assert_eq!(scheduler.try_start_next(&mut out), Ok(WaveId::new(1)));
        assert_eq!(
            out,
            vec![Command::BeginWave {
                wave: WaveId::new(1)
            }]
        );
        assert_eq!(
            scheduler.try_start_next(&mut out),
            Err(WaveRejection::WaveAlreadyInProgress)
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn large_dt_releases_every_due_spawn() {
        let mut scheduler = WaveScheduler::new(1);
        let mut out = Vec::new();
        let _ = scheduler.try_start_next(&mut out);
        out.clear();

        scheduler.handle(Duration::from_millis(2_500), &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(scheduler.progress().spawned, 3);
        assert_eq!(scheduler.progress().total, 6);
    }

    #[test]
    fn resumed_scheduler_continues_after_last_completed_wave() {
        let mut scheduler = WaveScheduler::resume(5, 3);
        let mut out = Vec::new();
        assert_eq!(scheduler.try_start_next(&mut out), Ok(WaveId::new(4)));

        let exhausted = WaveScheduler::resume(5, 5);
        assert_eq!(exhausted.status(), WaveStatus::Exhausted);
    }

    fn straggler(wave: u32, state: AttackerState) -> AttackerSnapshot {
        AttackerSnapshot {
            id: AttackerId::new(0),
            kind: AttackerKind::Grunt,
            wave: WaveId::new(wave),
            state,
            position: Vec2::ZERO,
            heading: Vec2::X,
            progress: 0.5,
            hp: 10.0,
            max_hp: 60.0,
        }
    }

    #[test]
    fn completion_waits_for_live_attackers_from_any_wave() {
        let mut scheduler = WaveScheduler::new(3);
        let mut out = Vec::new();
        let _ = scheduler.try_start_next(&mut out);
        scheduler.handle(Duration::from_secs(60), &mut out);
        out.clear();

        let manual = AttackerView::from_snapshots(vec![straggler(9, AttackerState::Active)]);
        scheduler.check_completion(&manual, &mut out);
        assert!(out.is_empty());
        assert_eq!(scheduler.status(), WaveStatus::InProgress);

        let dying = AttackerView::from_snapshots(vec![straggler(9, AttackerState::Dying)]);
        scheduler.check_completion(&dying, &mut out);
        assert_eq!(
            out,
            vec![Command::CompleteWave {
                wave: WaveId::new(1),
                reward: 25,
                final_wave: false,
            }]
        );
        assert_eq!(scheduler.status(), WaveStatus::Idle);
    }
}
