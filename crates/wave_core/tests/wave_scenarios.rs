//! End-to-end wave scenarios driven through `Simulation`.

use wave_core::prelude::*;
use wave_test_utils::fixtures::{
    fixed, killer_tower, sample_config, scenario_config, scenario_tiers, template, RecordingScene,
    SceneCall,
};

fn countdown_ticks(events: &[WaveEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            WaveEvent::CountdownTick { seconds_remaining } => Some(*seconds_remaining),
            _ => None,
        })
        .collect()
}

#[test]
fn tier_table_scenario_counts() {
    let table = WaveTable::new(&scenario_tiers()).unwrap();
    let counts: Vec<Option<i64>> = [1, 3, 4, 10].iter().map(|&w| table.wave_count(w)).collect();
    assert_eq!(counts, vec![Some(7), Some(11), Some(21), Some(27)]);
}

#[test]
fn allocation_scenario_ten_across_three() {
    let locations: Vec<SpawnLocation> = (0..3)
        .map(|i| SpawnLocation::at(Vec2Fixed::from_ints(i, 0)))
        .collect();
    let result = allocate(10, Percent::new(70).unwrap(), &locations).unwrap();

    let per_location: Vec<i64> = result.iter().map(LocationAllocation::total).collect();
    assert_eq!(per_location, vec![4, 3, 3]);
    assert_eq!(result.iter().map(|a| a.melee).sum::<i64>(), 7);
    assert_eq!(result.iter().map(|a| a.ranged).sum::<i64>(), 3);
}

#[test]
fn first_wave_creates_instances_with_prefabs() {
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(5)).unwrap();
    sim.start(&mut scene);

    assert_eq!(scene.created(), 7);
    let melee_creates = scene
        .calls
        .iter()
        .filter(|call| matches!(call, SceneCall::Create { kind: HostileKind::Melee, prefab, .. } if prefab == "melee"))
        .count();
    assert_eq!(melee_creates, 5);
}

#[test]
fn full_cycle_recycles_hostiles() {
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(9)).unwrap();
    let tower = sim.add_tower(Vec2Fixed::ZERO, 10_000, killer_tower());
    sim.start(&mut scene);

    let mut ticks = 0;
    while sim.current_wave() < 2 {
        sim.tick(&mut scene);
        ticks += 1;
        assert!(ticks < 1_000, "wave 1 never completed");
    }

    // Wave 2 (9 hostiles) reuses all 7 bodies from wave 1.
    assert_eq!(scene.created(), 9);
    assert_eq!(scene.reactivated(), 7);
    assert_eq!(scene.cue_count(Cue::Death), 7);
    assert!(scene
        .calls
        .iter()
        .any(|call| matches!(call, SceneCall::Cue { entity, cue: Cue::Attack } if *entity == tower)));

    let events = sim.drain_events();
    assert_eq!(countdown_ticks(&events), vec![5, 4, 3, 2, 1, 0]);
    assert_eq!(
        events.last(),
        Some(&WaveEvent::PopulationChanged { living: 9 })
    );
}

#[test]
fn dead_hostiles_halt_and_count_until_despawned() {
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(2)).unwrap();
    sim.start(&mut scene);

    let killed = sim.kill_all_hostiles(&mut scene);
    assert_eq!(killed.len(), 7);
    for id in &killed {
        assert!(scene.calls.contains(&SceneCall::Halt { entity: *id }));
        assert!(sim.hostile(*id).unwrap().is_dead());
    }

    // Despawn delay is 5 ticks in the scenario config.
    for _ in 0..5 {
        sim.tick(&mut scene);
        assert_eq!(sim.living_count(), 7);
    }
    let events = sim.tick(&mut scene);
    assert_eq!(events.released.len(), 7);
    assert_eq!(sim.living_count(), 0);
    assert_eq!(sim.phase(), SchedulerPhase::Countdown);
}

#[test]
fn paused_countdown_needs_the_same_active_ticks() {
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(4)).unwrap();
    sim.start(&mut scene);
    sim.kill_all_hostiles(&mut scene);

    while sim.phase() != SchedulerPhase::Countdown {
        sim.tick(&mut scene);
    }
    sim.drain_events();

    // The countdown started (and took its first step) on the last tick.
    let mut active_ticks = 1;
    while sim.countdown_remaining() != Some(3) {
        sim.tick(&mut scene);
        active_ticks += 1;
    }
    sim.drain_events();

    sim.toggle_pause();
    for _ in 0..10 {
        sim.tick(&mut scene);
    }
    assert!(countdown_ticks(&sim.drain_events()).is_empty());
    assert_eq!(sim.countdown_remaining(), Some(3));
    sim.toggle_pause();

    while sim.current_wave() == 1 {
        sim.tick(&mut scene);
        active_ticks += 1;
    }

    // 5 seconds at 20 ticks per second.
    assert_eq!(active_ticks, 100);
}

#[test]
fn hostiles_walk_before_striking() {
    let mut scene = RecordingScene::stalled();
    let mut sim = Simulation::new(scenario_config(6)).unwrap();
    let tower = sim.add_tower(Vec2Fixed::ZERO, 100, AttackProfile::within_range(0, fixed(0), 10));
    sim.start(&mut scene);

    for _ in 0..20 {
        assert!(sim.tick(&mut scene).strikes.is_empty());
    }
    let destinations = scene
        .calls
        .iter()
        .filter(|call| matches!(call, SceneCall::Destination { position, .. } if *position == Vec2Fixed::ZERO))
        .count();
    assert_eq!(destinations, 7);

    scene.arrived = true;
    let events = sim.tick(&mut scene);
    assert_eq!(events.strikes.len(), 7);
    assert!(events.strikes.iter().all(|s| s.target == tower));
}

#[test]
fn destroyed_tower_cue_fires_once() {
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(8)).unwrap();
    let tower = sim.add_tower(Vec2Fixed::ZERO, 5, AttackProfile::within_range(0, fixed(0), 10));
    sim.start(&mut scene);

    for _ in 0..50 {
        sim.tick(&mut scene);
    }

    assert!(sim.defender(tower).unwrap().is_destroyed());
    assert_eq!(scene.cue_count(Cue::Destroyed), 1);
    assert_eq!(sim.repair_tower(tower, 50).unwrap(), 0);
}

#[test]
fn hostiles_prefer_nearest_defender() {
    let mut scene = RecordingScene::stalled();
    let mut sim = Simulation::new(scenario_config(12)).unwrap();
    let idle = AttackProfile::within_range(0, fixed(0), 10);
    let far = sim.add_tower(Vec2Fixed::from_ints(-50, 0), 100, idle);
    let player = sim.add_player(Vec2Fixed::from_ints(12, 0), idle);
    sim.start(&mut scene);
    sim.tick(&mut scene);

    assert!(sim
        .hostiles()
        .all(|h| h.targeting().target() == Some(player)));
    assert!(sim.defender(far).is_some());
}

fn live_kinds(sim: &Simulation) -> (usize, usize) {
    let melee = sim.hostiles().filter(|h| h.kind() == HostileKind::Melee).count();
    (melee, sim.living_count() - melee)
}

#[test]
fn sample_asset_waves_follow_its_tiers() {
    let config = sample_config();
    let table = WaveTable::new(&config.tiers).unwrap();
    let counts: Vec<Option<i64>> = [1, 3, 4, 7, 8, 12].iter().map(|&w| table.wave_count(w)).collect();
    assert_eq!(
        counts,
        vec![Some(7), Some(11), Some(15), Some(24), Some(21), Some(25)]
    );
    assert_eq!(table.composition(4).unwrap().split(), (9, 6));
    assert_eq!(table.composition(8).unwrap().split(), (10, 11));

    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(config).unwrap();
    sim.start(&mut scene);

    // 7 at 70% melee, spread 3/2/2 over the three spawn points.
    assert_eq!(live_kinds(&sim), (5, 2));
    assert_eq!(scene.created(), 7);

    // Wave 2 is 9 at 70%: 6 melee, 3 ranged on top of wave 1.
    sim.force_next_wave(&mut scene);
    assert_eq!(sim.current_wave(), 2);
    assert_eq!(live_kinds(&sim), (11, 5));

    let towers = sim.defenders().filter(|d| d.kind() == DefenderKind::Tower).count();
    let players = sim.defenders().filter(|d| d.kind() == DefenderKind::Player).count();
    assert_eq!((towers, players), (2, 1));
}

#[test]
fn defenders_let_go_of_released_hostiles() {
    let mut config = SimConfig::with_tiers(vec![TierSpec::infinite(0, 1)]);
    config.despawn_delay_ticks = 0;
    config.spawn_locations = vec![SpawnLocation::at(Vec2Fixed::from_ints(5, 0))];
    config.hostiles = vec![
        template(HostileKind::Melee, 10, 1, 10),
        template(HostileKind::Ranged, 10, 1, 10),
    ];

    let mut scene = NullScene;
    let mut sim = Simulation::new(config).unwrap();
    let watcher = sim.add_tower(Vec2Fixed::ZERO, 1_000, AttackProfile::within_range(0, fixed(30), 1));
    let killer = sim.add_tower(Vec2Fixed::ZERO, 1_000, AttackProfile::within_range(50, fixed(30), 1));
    sim.start(&mut scene);
    let first = sim.hostiles().next().unwrap().id();

    let mut ticks = 0;
    while sim.phase() != SchedulerPhase::Countdown {
        sim.tick(&mut scene);
        ticks += 1;
        assert!(ticks < 20, "wave 1 never completed");
    }
    assert!(sim.pool().is_pooled(first));

    // Wave 2 brings the same id back as a fresh hostile.
    sim.force_next_wave(&mut scene);
    assert!(sim.pool().is_live(first));
    for tower in [watcher, killer] {
        assert_eq!(sim.defender(tower).unwrap().targeting().target(), None);
    }

    // Targets are re-acquired before anyone fires again.
    let events = sim.tick(&mut scene);
    assert!(events.strikes.iter().all(|s| s.attacker != watcher && s.attacker != killer));
}

#[test]
fn kind_without_prefabs_is_skipped() {
    let mut config = scenario_config(3);
    config.hostiles[0].prefabs.clear();
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(config).unwrap();
    sim.start(&mut scene);

    // Wave 1 is 5 melee and 2 ranged; only the ranged exist.
    assert_eq!(live_kinds(&sim), (0, 2));
    assert_eq!(scene.created(), 2);
    assert_eq!(sim.phase(), SchedulerPhase::WaveActive);
}

#[test]
fn missing_spawn_locations_keep_waves_rolling() {
    let mut config = scenario_config(1);
    config.spawn_locations.clear();
    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(config).unwrap();
    sim.start(&mut scene);

    assert_eq!(sim.living_count(), 0);
    assert_eq!(sim.phase(), SchedulerPhase::Countdown);
    for _ in 0..100 {
        sim.tick(&mut scene);
    }
    assert_eq!(sim.current_wave(), 2);
}

#[test]
fn subscribers_receive_wave_changes() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let waves = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&waves);

    let mut scene = RecordingScene::arriving();
    let mut sim = Simulation::new(scenario_config(1)).unwrap();
    sim.subscribe(move |event| {
        if let WaveEvent::WaveChanged { wave } = event {
            sink.borrow_mut().push(*wave);
        }
    });

    sim.start(&mut scene);
    sim.force_next_wave(&mut scene);
    sim.force_next_wave(&mut scene);

    assert_eq!(*waves.borrow(), vec![1, 2, 3]);
}
