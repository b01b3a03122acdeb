//! Cross-crate tests: automation config files on disk drive a scheduler over
//! the reference world.

use std::fs;
use std::path::{Path, PathBuf};
use tilework_core::event::WorldEvent;
use tilework_core::grid::GridWorld;
use tilework_core::scheduler::{LocationStatus, TickOutcome};
use tilework_core::test_utils::*;
use tilework_data::{DataLoadError, find_config, load_config};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tilework_core=debug,tilework_data=debug")
        .try_init();
}

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tilework_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

/// Bee house at (0,0) and chest at (3,0), linked only if (1,0) and (2,0) are
/// configured connectors. (1,0) is gravel, (2,0) is wood floor.
fn bridged_farm() -> (GridWorld, tilework_core::id::EntityId) {
    let mut world = GridWorld::new();
    let grid = world.add_location(farm());
    grid.place_machine(ready_source(honey(), 2), at(0, 0)).unwrap();
    let c = grid.place_container(chest(10), at(3, 0)).unwrap();
    grid.set_floor(pos(1, 0), gravel());
    grid.set_floor(pos(2, 0), wood_floor());
    (world, c)
}

// ===========================================================================
// Connector selection
// ===========================================================================

#[test]
fn configured_connectors_decide_the_bridge() {
    init_tracing();
    let dir = make_test_dir("bridge");

    let only_gravel = dir.join("gravel.toml");
    fs::write(&only_gravel, "tick_interval = 1\nconnectors = [\"GravelPath\"]").unwrap();
    let both = dir.join("both.ron");
    fs::write(&both, r#"(tick_interval: 1, connectors: ["gravelpath", "WoodFloor"])"#).unwrap();

    let (mut world, c) = bridged_farm();
    let mut sched = load_config(&only_gravel).unwrap().into_scheduler();
    sched.handle_event(&WorldEvent::WorldLoaded, &world);
    sched.tick(&mut world);
    assert_eq!(sched.groups(farm()).len(), 2);
    assert_eq!(chest_count(world.grid(farm()).unwrap(), c, honey()), 0);

    let (mut world, c) = bridged_farm();
    let mut sched = load_config(&both).unwrap().into_scheduler();
    sched.handle_event(&WorldEvent::WorldLoaded, &world);
    sched.tick(&mut world);
    assert_eq!(sched.groups(farm()).len(), 1);
    assert_eq!(sched.groups(farm())[0].connectors(), &[pos(1, 0), pos(2, 0)]);
    assert_eq!(chest_count(world.grid(farm()).unwrap(), c, honey()), 2);

    cleanup(&dir);
}

#[test]
fn unknown_connector_names_degrade_to_adjacency_only() {
    init_tracing();
    let dir = make_test_dir("unknown_names");
    fs::write(
        dir.join("automation.json"),
        r#"{"tick_interval": 1, "connectors": ["MoonPath"]}"#,
    )
    .unwrap();

    let config = find_config(&dir).unwrap();
    assert!(config.connectors.is_empty());
    assert_eq!(config.connectors.unmatched(), &["MoonPath".to_string()]);

    let (mut world, _) = bridged_farm();
    let mut sched = config.into_scheduler();
    sched.handle_event(&WorldEvent::WorldLoaded, &world);
    assert!(matches!(sched.tick(&mut world), TickOutcome::Completed(_)));
    assert_eq!(sched.groups(farm()).len(), 2);

    cleanup(&dir);
}

// ===========================================================================
// Interval
// ===========================================================================

#[test]
fn interval_from_config_controls_cycle_timing() {
    init_tracing();
    let dir = make_test_dir("interval");
    fs::write(dir.join("automation.toml"), "tick_interval = 4").unwrap();

    let (mut world, _) = bridged_farm();
    let mut sched = find_config(&dir).unwrap().into_scheduler();
    sched.handle_event(&WorldEvent::WorldLoaded, &world);

    for remaining in [3, 2, 1] {
        assert_eq!(sched.tick(&mut world), TickOutcome::Waiting { remaining });
    }
    assert_eq!(sched.location_status(farm()), LocationStatus::Queued);
    assert!(matches!(sched.tick(&mut world), TickOutcome::Completed(_)));
    assert_eq!(sched.location_status(farm()), LocationStatus::Built);

    cleanup(&dir);
}

#[test]
fn invalid_config_is_reported_not_defaulted() {
    let dir = make_test_dir("invalid");
    fs::write(dir.join("automation.ron"), "(tick_interval: 0)").unwrap();
    assert!(matches!(
        find_config(&dir),
        Err(DataLoadError::Invalid { .. })
    ));

    fs::write(dir.join("automation.ron"), "(tick_interval: \"soon\")").unwrap();
    assert!(matches!(find_config(&dir), Err(DataLoadError::Parse { .. })));

    cleanup(&dir);
}

// ===========================================================================
// Failure and recovery
// ===========================================================================

#[test]
fn failed_rebuild_recovers_after_config_driven_start() {
    init_tracing();
    let dir = make_test_dir("recovery");
    fs::write(
        dir.join("automation.json"),
        r#"{"tick_interval": 2, "connectors": ["GravelPath"]}"#,
    )
    .unwrap();

    let mut world = HauntedWorld::new();
    let loc = world.add_location(farm());
    loc.grid.place_machine(ready_source(honey(), 1), at(0, 0)).unwrap();
    let c = loc.grid.place_container(chest(10), at(0, 2)).unwrap();
    loc.grid.set_floor(pos(0, 1), gravel());
    loc.haunt(pos(8, 8));

    let mut sched = find_config(&dir).unwrap().into_scheduler();
    sched.handle_event(&WorldEvent::WorldLoaded, &world);
    sched.tick(&mut world);
    assert_eq!(sched.tick(&mut world), TickOutcome::Failed);

    let notices = sched.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "rebuild");
    assert!(!notices[0].message.is_empty());
    assert_eq!(sched.location_status(farm()), LocationStatus::Queued);

    world.add_location(farm()).exorcise();
    sched.tick(&mut world);
    assert!(matches!(sched.tick(&mut world), TickOutcome::Completed(_)));
    assert_eq!(chest_count(&world.add_location(farm()).grid, c, honey()), 1);

    cleanup(&dir);
}
