use std::time::Duration;

use lane_defence_core::{
    AttackerId, AttackerKind, Command, DefenderId, DefenderKind, DefenderTarget, Event,
    LevelConfig, Vec2, WaveId,
};
use lane_defence_system_targeting::DefenderTargeting;
use lane_defence_world::{self as world, query, World};

fn scripted_commands() -> Vec<Command> {
    let tick = Command::Tick {
        dt: Duration::from_millis(250),
    };
    let spawn = Command::SpawnAttacker {
        kind: AttackerKind::Grunt,
        wave: WaveId::new(1),
    };
    vec![
        Command::PlaceDefender {
            kind: DefenderKind::Arrow,
            position: Vec2::new(80.0, 30.0),
        },
        Command::PlaceDefender {
            kind: DefenderKind::Frost,
            position: Vec2::new(200.0, -30.0),
        },
        spawn.clone(),
        tick.clone(),
        spawn,
        tick.clone(),
        tick.clone(),
        tick.clone(),
        tick,
    ]
}

fn replay(commands: Vec<Command>) -> (Vec<Vec<DefenderTarget>>, Vec<Event>) {
    let level = LevelConfig {
        waypoints: vec![[0.0, 0.0], [400.0, 0.0]],
        playfield: None,
        starting_gold: 500,
        starting_lives: 10,
        total_waves: 1,
    }
    .validate()
    .expect("valid level");
    let mut world = World::new(&level).expect("world");
    let mut targeting = DefenderTargeting::new();
    let mut assignments = Vec::new();
    let mut events = Vec::new();

    for command in commands {
        world::apply(&mut world, command, &mut events);
        let mut targets = Vec::new();
        targeting.handle(
            query::clock(&world),
            &query::defender_view(&world),
            &query::attacker_view(&world),
            &mut targets,
        );
        assignments.push(targets);
    }

    (assignments, events)
}

#[test]
fn replay_produces_identical_assignments() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());
    assert_eq!(first.0, second.0, "replay diverged between runs");
    assert_eq!(first.1, second.1);

    let (assignments, _) = first;
    assert!(
        assignments[..3].iter().all(Vec::is_empty),
        "attackers are not targetable before their first tick"
    );
    let arrow_on_first = vec![DefenderTarget {
        defender: DefenderId::new(0),
        attacker: AttackerId::new(0),
    }];
    assert_eq!(assignments[3], arrow_on_first);
    assert_eq!(
        assignments[4], arrow_on_first,
        "a freshly spawned attacker is not a candidate"
    );
    assert!(assignments[5..].iter().all(|targets| !targets.is_empty()));
}
