//! Machine groups: the unit of automation.
//!
//! A [`MachineGroup`] is an immutable snapshot produced by discovery. Each
//! scheduling pass calls [`MachineGroup::automate`], which moves finished
//! output from machines into containers and feeds machines from containers,
//! touching nothing outside the group.

use crate::id::{EntityId, ItemTypeId, LocationId};
use crate::item::ItemStack;
use crate::machine::{Container, Machine, MachineError};
use crate::tile::TilePos;
use crate::world::Location;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Errors and report
// ---------------------------------------------------------------------------

/// Failures raised while a group moves items.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomationError {
    #[error("machine {entity:?} in {location:?} no longer exists")]
    MissingMachine {
        location: LocationId,
        entity: EntityId,
    },
    #[error("container {entity:?} in {location:?} no longer exists")]
    MissingContainer {
        location: LocationId,
        entity: EntityId,
    },
    #[error("machine {entity:?} in {location:?} rejected its inputs: {source}")]
    Machine {
        location: LocationId,
        entity: EntityId,
        source: MachineError,
    },
}

impl AutomationError {
    /// The group no longer matches the world and must be rediscovered.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            AutomationError::MissingMachine { .. } | AutomationError::MissingContainer { .. }
        )
    }
}

/// What one or more automation passes accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomationReport {
    /// Items moved from machine output into containers.
    pub items_stored: u32,
    /// Items withdrawn from containers to feed machines.
    pub items_pulled: u32,
    /// Machines that began a production cycle.
    pub machines_started: u32,
}

impl AutomationReport {
    pub fn merge(&mut self, other: AutomationReport) {
        self.items_stored += other.items_stored;
        self.items_pulled += other.items_pulled;
        self.machines_started += other.machines_started;
    }

    /// Returns `true` if nothing moved.
    pub fn is_idle(&self) -> bool {
        *self == AutomationReport::default()
    }
}

// ---------------------------------------------------------------------------
// MachineGroup
// ---------------------------------------------------------------------------

/// A connected cluster of machines, containers and connector tiles.
///
/// Member lists are sorted by id; automation walks them in that order, so the
/// first container with room always receives output first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineGroup {
    location: LocationId,
    machines: Vec<EntityId>,
    containers: Vec<EntityId>,
    connectors: Vec<TilePos>,
    tiles: BTreeSet<TilePos>,
}

impl MachineGroup {
    pub(crate) fn new(
        location: LocationId,
        machines: Vec<EntityId>,
        containers: Vec<EntityId>,
        connectors: Vec<TilePos>,
        tiles: BTreeSet<TilePos>,
    ) -> Self {
        Self {
            location,
            machines,
            containers,
            connectors,
            tiles,
        }
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn machines(&self) -> &[EntityId] {
        &self.machines
    }

    pub fn containers(&self) -> &[EntityId] {
        &self.containers
    }

    pub fn connectors(&self) -> &[TilePos] {
        &self.connectors
    }

    pub fn tiles(&self) -> &BTreeSet<TilePos> {
        &self.tiles
    }

    pub fn contains_tile(&self, pos: TilePos) -> bool {
        self.tiles.contains(&pos)
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.machines.contains(&entity) || self.containers.contains(&entity)
    }

    /// A group needs at least one machine and one container to move anything.
    pub fn has_work(&self) -> bool {
        !self.machines.is_empty() && !self.containers.is_empty()
    }

    /// Run one automation pass over this group.
    ///
    /// Every machine's output is stored before any machine is supplied, so
    /// output stored this pass can feed another machine in the same pass.
    /// Interactions that are not possible right now are skipped. An error
    /// means the location no longer matches this snapshot.
    pub fn automate<L: Location + ?Sized>(
        &self,
        location: &mut L,
    ) -> Result<AutomationReport, AutomationError> {
        let mut report = AutomationReport::default();
        if !self.has_work() {
            return Ok(report);
        }

        for &machine in &self.machines {
            self.store_output(location, machine, &mut report)?;
        }
        for &machine in &self.machines {
            self.supply_inputs(location, machine, &mut report)?;
        }
        Ok(report)
    }

    fn store_output<L: Location + ?Sized>(
        &self,
        location: &mut L,
        machine: EntityId,
        report: &mut AutomationReport,
    ) -> Result<(), AutomationError> {
        let m = self.machine_mut(location, machine)?;
        if !m.can_produce() {
            return Ok(());
        }
        let Some(mut stack) = m.take_output() else {
            return Ok(());
        };

        for &entity in &self.containers {
            let container = match self.container_mut(location, entity) {
                Ok(container) => container,
                Err(err) => {
                    self.machine_mut(location, machine)?.restore_output(stack);
                    return Err(err);
                }
            };
            if !container.has_space() {
                continue;
            }
            // Host containers are not trusted to report less than they got.
            let overflow = container.insert(&stack).min(stack.quantity);
            report.items_stored += stack.quantity - overflow;
            stack.quantity = overflow;
            if stack.is_empty() {
                break;
            }
        }

        if !stack.is_empty() {
            self.machine_mut(location, machine)?.restore_output(stack);
        }
        Ok(())
    }

    fn supply_inputs<L: Location + ?Sized>(
        &self,
        location: &mut L,
        machine: EntityId,
        report: &mut AutomationReport,
    ) -> Result<(), AutomationError> {
        let m = self.machine_mut(location, machine)?;
        if !m.can_consume() {
            return Ok(());
        }
        let Some(request) = m.input_request() else {
            return Ok(());
        };

        let mut needed: BTreeMap<ItemTypeId, u32> = BTreeMap::new();
        for stack in request.iter().filter(|s| !s.is_empty()) {
            *needed.entry(stack.item_type).or_default() += stack.quantity;
        }
        if needed.is_empty() {
            return Ok(());
        }

        for (&item, &quantity) in &needed {
            if self.stock_of(location, item)? < quantity {
                return Ok(());
            }
        }

        let mut taken = Vec::with_capacity(needed.len());
        for (item, quantity) in needed {
            let mut remaining = quantity;
            for &entity in &self.containers {
                if remaining == 0 {
                    break;
                }
                let removed = self.container_mut(location, entity)?.remove(item, remaining);
                remaining -= removed.min(remaining);
            }
            taken.push(ItemStack::new(item, quantity - remaining));
        }

        let started = self.machine_mut(location, machine)?.start(taken.clone());
        match started {
            Ok(()) => {
                report.items_pulled += taken.iter().map(|s| s.quantity).sum::<u32>();
                report.machines_started += 1;
                Ok(())
            }
            Err(source) => {
                // Put the inputs back before surfacing the fault.
                for stack in &taken {
                    self.return_to_containers(location, stack)?;
                }
                Err(AutomationError::Machine {
                    location: self.location,
                    entity: machine,
                    source,
                })
            }
        }
    }

    fn stock_of<L: Location + ?Sized>(
        &self,
        location: &mut L,
        item: ItemTypeId,
    ) -> Result<u32, AutomationError> {
        let mut total = 0u32;
        for &entity in &self.containers {
            total = total.saturating_add(self.container_mut(location, entity)?.quantity(item));
        }
        Ok(total)
    }

    fn return_to_containers<L: Location + ?Sized>(
        &self,
        location: &mut L,
        stack: &ItemStack,
    ) -> Result<(), AutomationError> {
        let mut rest = stack.clone();
        for &entity in &self.containers {
            if rest.is_empty() {
                break;
            }
            let overflow = self.container_mut(location, entity)?.insert(&rest);
            rest.quantity = overflow.min(rest.quantity);
        }
        Ok(())
    }

    fn machine_mut<'l, L: Location + ?Sized>(
        &self,
        location: &'l mut L,
        entity: EntityId,
    ) -> Result<&'l mut dyn Machine, AutomationError> {
        location
            .machine_mut(entity)
            .ok_or(AutomationError::MissingMachine {
                location: self.location,
                entity,
            })
    }

    fn container_mut<'l, L: Location + ?Sized>(
        &self,
        location: &'l mut L,
        entity: EntityId,
    ) -> Result<&'l mut dyn Container, AutomationError> {
        location
            .container_mut(entity)
            .ok_or(AutomationError::MissingContainer {
                location: self.location,
                entity,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineGroupBuilder;
    use crate::grid::LocationGrid;
    use crate::item::Chest;
    use crate::machine::{MachineState, RecipeMachine, SourceMachine};
    use crate::test_utils::*;
    use crate::world::Location;

    /// Build a group from explicit members, bypassing discovery.
    fn group_of(grid: &LocationGrid, machines: &[EntityId], containers: &[EntityId]) -> MachineGroup {
        let mut builder = MachineGroupBuilder::new(grid.id());
        for &m in machines {
            builder.add_machine(m);
        }
        for &c in containers {
            builder.add_container(c);
        }
        builder.build()
    }

    #[test]
    fn output_moves_into_first_container_with_space() {
        let mut grid = LocationGrid::new(farm());
        let full = grid
            .place_container(Chest::new("full", 5).with_items(wood(), 5), at(0, 0))
            .unwrap();
        let open = grid.place_container(chest(50), at(1, 0)).unwrap();
        let spare = grid.place_container(chest(50), at(2, 0)).unwrap();
        let tapper = grid.place_machine(ready_source(honey(), 3), at(0, 1)).unwrap();

        let group = group_of(&grid, &[tapper], &[full, open, spare]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.items_stored, 3);
        assert_eq!(chest_count(&grid, open, honey()), 3);
        assert_eq!(chest_count(&grid, spare, honey()), 0);
        assert_eq!(chest_count(&grid, full, honey()), 0);
    }

    #[test]
    fn overflow_spills_to_next_container_then_back_to_machine() {
        let mut grid = LocationGrid::new(farm());
        let a = grid.place_container(chest(2), at(0, 0)).unwrap();
        let b = grid.place_container(chest(3), at(1, 0)).unwrap();
        let tapper = grid.place_machine(ready_source(honey(), 7), at(0, 1)).unwrap();

        let group = group_of(&grid, &[tapper], &[a, b]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.items_stored, 5);
        assert_eq!(chest_count(&grid, a, honey()), 2);
        assert_eq!(chest_count(&grid, b, honey()), 3);
        let m = grid.machine_as::<SourceMachine>(tapper).unwrap();
        assert_eq!(
            m.state,
            MachineState::Ready {
                output: ItemStack::new(honey(), 2)
            }
        );
    }

    #[test]
    fn inputs_are_pulled_across_containers_and_machine_starts() {
        let mut grid = LocationGrid::new(farm());
        let a = grid.place_container(chest(50).with_items(copper_ore(), 3), at(0, 0)).unwrap();
        let b = grid
            .place_container(chest(50).with_items(copper_ore(), 4).with_items(coal(), 1), at(1, 0))
            .unwrap();
        let furnace = grid.place_machine(furnace(), at(2, 0)).unwrap();

        let group = group_of(&grid, &[furnace], &[a, b]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.machines_started, 1);
        assert_eq!(report.items_pulled, 6);
        assert_eq!(chest_count(&grid, a, copper_ore()), 0);
        assert_eq!(chest_count(&grid, b, copper_ore()), 2);
        assert_eq!(chest_count(&grid, b, coal()), 0);
        assert!(grid.machine_as::<RecipeMachine>(furnace).unwrap().is_working());
    }

    #[test]
    fn insufficient_stock_is_skipped_not_an_error() {
        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(chest(50).with_items(copper_ore(), 4), at(0, 0)).unwrap();
        let furnace = grid.place_machine(furnace(), at(1, 0)).unwrap();

        let group = group_of(&grid, &[furnace], &[c]);
        let report = group.automate(&mut grid).unwrap();

        assert!(report.is_idle());
        assert_eq!(chest_count(&grid, c, copper_ore()), 4);
        assert!(grid.machine_as::<RecipeMachine>(furnace).unwrap().is_idle());
    }

    #[test]
    fn busy_machine_is_left_alone() {
        let mut grid = LocationGrid::new(farm());
        let c = grid
            .place_container(chest(50).with_items(copper_ore(), 10).with_items(coal(), 2), at(0, 0))
            .unwrap();
        let furnace = grid.place_machine(furnace(), at(1, 0)).unwrap();
        let group = group_of(&grid, &[furnace], &[c]);

        let first = group.automate(&mut grid).unwrap();
        let second = group.automate(&mut grid).unwrap();
        assert_eq!(first.machines_started, 1);
        assert!(second.is_idle());
        assert_eq!(chest_count(&grid, c, copper_ore()), 5);
    }

    #[test]
    fn finished_output_stored_and_next_cycle_started_in_one_pass() {
        let mut grid = LocationGrid::new(farm());
        let c = grid
            .place_container(chest(50).with_items(copper_ore(), 5).with_items(coal(), 1), at(0, 0))
            .unwrap();
        let mut m = furnace();
        m.state = MachineState::Ready {
            output: ItemStack::new(copper_bar(), 1),
        };
        let furnace = grid.place_machine(m, at(1, 0)).unwrap();

        let group = group_of(&grid, &[furnace], &[c]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.items_stored, 1);
        assert_eq!(report.machines_started, 1);
        assert_eq!(chest_count(&grid, c, copper_bar()), 1);
    }

    #[test]
    fn output_stored_this_pass_feeds_another_machine() {
        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(chest(50).with_items(coal(), 1), at(0, 0)).unwrap();
        let furnace = grid.place_machine(furnace(), at(1, 0)).unwrap();
        let tapper = grid.place_machine(ready_source(copper_ore(), 5), at(0, 1)).unwrap();

        // The furnace comes first, so it is only supplied if every output is
        // stored before any input is pulled.
        let group = group_of(&grid, &[furnace, tapper], &[c]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.items_stored, 5);
        assert_eq!(report.machines_started, 1);
        assert_eq!(chest_count(&grid, c, copper_ore()), 0);
        assert!(grid.machine_as::<RecipeMachine>(furnace).unwrap().is_working());
    }

    #[test]
    fn misreported_container_counts_are_clamped() {
        // Claims endless stock, hands out more than asked and bounces more
        // than it was given.
        #[derive(Debug)]
        struct Bottomless;
        impl Container for Bottomless {
            fn name(&self) -> &str {
                "bottomless"
            }
            fn has_space(&self) -> bool {
                true
            }
            fn insert(&mut self, stack: &ItemStack) -> u32 {
                stack.quantity + 10
            }
            fn quantity(&self, _item_type: ItemTypeId) -> u32 {
                u32::MAX
            }
            fn remove(&mut self, _item_type: ItemTypeId, quantity: u32) -> u32 {
                quantity + 10
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(Bottomless, at(0, 0)).unwrap();
        let tapper = grid.place_machine(ready_source(honey(), 3), at(1, 0)).unwrap();
        let furnace = grid.place_machine(furnace(), at(0, 1)).unwrap();

        let group = group_of(&grid, &[tapper, furnace], &[c]);
        let report = group.automate(&mut grid).unwrap();

        assert_eq!(report.items_stored, 0);
        assert_eq!(report.items_pulled, 6);
        assert_eq!(report.machines_started, 1);
        let m = grid.machine_as::<SourceMachine>(tapper).unwrap();
        assert_eq!(
            m.state,
            MachineState::Ready {
                output: ItemStack::new(honey(), 3)
            }
        );
    }

    #[test]
    fn connector_only_group_is_noop() {
        let mut grid = LocationGrid::new(farm());
        let mut builder = MachineGroupBuilder::new(farm());
        builder.add_connector(TilePos::new(0, 0));
        let group = builder.build();

        assert!(!group.has_work());
        assert!(group.automate(&mut grid).unwrap().is_idle());
    }

    #[test]
    fn missing_member_is_an_error() {
        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(chest(10), at(0, 0)).unwrap();
        let tapper = grid.place_machine(ready_source(honey(), 1), at(1, 0)).unwrap();
        let group = group_of(&grid, &[tapper], &[c]);

        grid.remove(c).unwrap();
        let err = group.automate(&mut grid).unwrap_err();
        assert_eq!(
            err,
            AutomationError::MissingContainer {
                location: farm(),
                entity: c
            }
        );
        // The output taken before the fault is handed back.
        let m = grid.machine_as::<SourceMachine>(tapper).unwrap();
        assert_eq!(
            m.state,
            MachineState::Ready {
                output: ItemStack::new(honey(), 1)
            }
        );
    }

    #[test]
    fn rejected_inputs_are_returned() {
        // A machine that asks for one thing and then refuses to start.
        #[derive(Debug)]
        struct Fussy;
        impl Machine for Fussy {
            fn name(&self) -> &str {
                "fussy"
            }
            fn can_produce(&self) -> bool {
                false
            }
            fn can_consume(&self) -> bool {
                true
            }
            fn take_output(&mut self) -> Option<ItemStack> {
                None
            }
            fn restore_output(&mut self, _stack: ItemStack) {}
            fn input_request(&self) -> Option<Vec<ItemStack>> {
                Some(vec![ItemStack::new(ItemTypeId(0), 2)])
            }
            fn start(&mut self, _inputs: Vec<ItemStack>) -> Result<(), MachineError> {
                Err(MachineError::Busy)
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let mut grid = LocationGrid::new(farm());
        let c = grid.place_container(chest(10).with_items(ItemTypeId(0), 2), at(0, 0)).unwrap();
        let m = grid.place_machine(Fussy, at(1, 0)).unwrap();
        let group = group_of(&grid, &[m], &[c]);

        let err = group.automate(&mut grid).unwrap_err();
        assert!(matches!(err, AutomationError::Machine { source: MachineError::Busy, .. }));
        assert_eq!(chest_count(&grid, c, ItemTypeId(0)), 2);
    }

    #[test]
    fn report_merge_accumulates() {
        let mut total = AutomationReport::default();
        total.merge(AutomationReport {
            items_stored: 2,
            items_pulled: 3,
            machines_started: 1,
        });
        total.merge(AutomationReport {
            items_stored: 1,
            items_pulled: 0,
            machines_started: 0,
        });
        assert_eq!(total.items_stored, 3);
        assert_eq!(total.items_pulled, 3);
        assert_eq!(total.machines_started, 1);
        assert!(!total.is_idle());
    }
}
