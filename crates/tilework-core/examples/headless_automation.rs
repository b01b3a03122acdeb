//! Headless automation: a bee house and a furnace feeding one chest over a
//! gravel path, driven for a few in-game minutes.
//!
//! Log output is controlled with `RUST_LOG`, e.g.
//! `RUST_LOG=tilework_core=debug`.
//!
//! Run with: `cargo run -p tilework-core --example headless_automation`

use tilework_core::connector::ConnectorRegistry;
use tilework_core::event::WorldEvent;
use tilework_core::grid::GridWorld;
use tilework_core::id::{FloorId, ItemTypeId, LocationId};
use tilework_core::item::{Chest, ItemStack};
use tilework_core::machine::{Recipe, RecipeMachine, SourceMachine};
use tilework_core::scheduler::{Scheduler, SchedulerConfig, TickOutcome};
use tilework_core::tile::{TileArea, TilePos};
use tracing_subscriber::EnvFilter;

const HONEY: ItemTypeId = ItemTypeId(340);
const COPPER_ORE: ItemTypeId = ItemTypeId(378);
const COAL: ItemTypeId = ItemTypeId(382);
const COPPER_BAR: ItemTypeId = ItemTypeId(334);
const GRAVEL_FLOOR: FloorId = FloorId(5);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Step 1: Lay out the farm ---

    let farm = LocationId(0);
    let mut world = GridWorld::new();
    let grid = world.add_location(farm);

    let chest = grid
        .place_container(
            Chest::new("storage", 500)
                .with_items(COPPER_ORE, 20)
                .with_items(COAL, 4),
            TileArea::single(TilePos::new(5, 5)),
        )
        .expect("storage tile is free");
    grid.place_machine(
        SourceMachine::new("bee house", ItemStack::new(HONEY, 1), 240),
        TileArea::single(TilePos::new(4, 5)),
    )
    .expect("bee house tile is free");
    grid.place_machine(
        RecipeMachine::new(
            "furnace",
            Recipe {
                inputs: vec![ItemStack::new(COPPER_ORE, 5), ItemStack::new(COAL, 1)],
                output: ItemStack::new(COPPER_BAR, 1),
                duration: 300,
            },
        ),
        TileArea::new(TilePos::new(8, 4), 2, 2),
    )
    .expect("furnace tiles are free");
    for x in 6..8 {
        grid.set_floor(TilePos::new(x, 5), GRAVEL_FLOOR);
    }

    // --- Step 2: Start the scheduler ---

    let mut scheduler = Scheduler::new(
        SchedulerConfig::default(),
        ConnectorRegistry::from_names(["GravelPath"]),
    );
    scheduler.handle_event(&WorldEvent::WorldLoaded, &world);

    // --- Step 3: Run ---

    for _ in 0..3_600 {
        world.advance(1);
        match scheduler.tick(&mut world) {
            TickOutcome::Waiting { .. } => {}
            TickOutcome::Completed(report) if !report.automation.is_idle() => {
                println!(
                    "tick {:>5}: stored {}, pulled {}, started {}",
                    scheduler.current_tick(),
                    report.automation.items_stored,
                    report.automation.items_pulled,
                    report.automation.machines_started,
                );
            }
            TickOutcome::Completed(_) => {}
            TickOutcome::Failed => {
                for notice in scheduler.drain_notices() {
                    println!("notice: {}", notice.message);
                }
            }
        }
    }

    // --- Step 4: Inspect the chest ---

    let storage = world
        .grid(farm)
        .and_then(|g| g.container_as::<Chest>(chest))
        .expect("storage chest still placed");
    println!(
        "storage: {} honey, {} copper bars, {} ore left",
        storage.count(HONEY),
        storage.count(COPPER_BAR),
        storage.count(COPPER_ORE),
    );
    for group in scheduler.groups(farm) {
        println!(
            "group: {} machines, {} containers, {} connector tiles",
            group.machines().len(),
            group.containers().len(),
            group.connectors().len(),
        );
    }
}
