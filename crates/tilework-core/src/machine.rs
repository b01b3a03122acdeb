//! Capability traits for automatable entities, plus reference machine variants.
//!
//! Discovery and scheduling only ever see [`Machine`] and [`Container`] trait
//! objects. What a machine actually makes is its own business: the engine asks
//! for finished output, offers inputs, and tells it to start.

use crate::id::ItemTypeId;
use crate::item::ItemStack;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// A production machine that automation can feed and empty.
pub trait Machine: std::fmt::Debug {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Whether this machine ever yields output.
    fn can_produce(&self) -> bool;

    /// Whether this machine ever accepts input.
    fn can_consume(&self) -> bool;

    /// Remove and return completed output, if any is ready.
    fn take_output(&mut self) -> Option<ItemStack>;

    /// Hand back output that found no room in any container.
    fn restore_output(&mut self, stack: ItemStack);

    /// Items needed to start the next cycle, or `None` if the machine is not
    /// accepting input right now.
    fn input_request(&self) -> Option<Vec<ItemStack>>;

    /// Start a production cycle with the given inputs.
    fn start(&mut self, inputs: Vec<ItemStack>) -> Result<(), MachineError>;

    /// Advance internal production by `ticks`. No-op by default.
    fn advance(&mut self, ticks: u32) {
        let _ = ticks;
    }

    /// Downcast to `&dyn Any` for access to concrete machine types.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A storage entity that supplies machine inputs and receives machine outputs.
pub trait Container: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Whether at least one more item fits.
    fn has_space(&self) -> bool;

    /// Store as much of `stack` as fits. Returns the quantity that didn't fit.
    fn insert(&mut self, stack: &ItemStack) -> u32;

    /// Quantity held of a given item type.
    fn quantity(&self, item_type: ItemTypeId) -> u32;

    /// Remove up to `quantity` items. Returns the amount actually removed.
    fn remove(&mut self, item_type: ItemTypeId, quantity: u32) -> u32;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Errors a machine can raise when handed inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("machine is busy")]
    Busy,
    #[error("inputs do not satisfy the recipe: missing {missing} of item {item:?}")]
    InputMismatch { item: ItemTypeId, missing: u32 },
    #[error("machine does not accept input")]
    NotAConsumer,
}

// ---------------------------------------------------------------------------
// Machine state
// ---------------------------------------------------------------------------

/// Runtime state shared by the reference machines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MachineState {
    #[default]
    Idle,
    Working {
        remaining: u32,
    },
    Ready {
        output: ItemStack,
    },
}

impl MachineState {
    /// Count down a working cycle; on completion move to `Ready` with `output`.
    fn tick_down(&mut self, ticks: u32, output: &ItemStack) {
        if let MachineState::Working { remaining } = self {
            *remaining = remaining.saturating_sub(ticks);
            if *remaining == 0 {
                *self = MachineState::Ready {
                    output: output.clone(),
                };
            }
        }
    }

    fn take_ready(&mut self) -> Option<ItemStack> {
        match std::mem::take(self) {
            MachineState::Ready { output } if !output.is_empty() => Some(output),
            MachineState::Ready { .. } => None,
            other => {
                *self = other;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source machine
// ---------------------------------------------------------------------------

/// Produces items from nothing on a fixed cycle (tappers, bee houses, wells).
#[derive(Debug, Clone)]
pub struct SourceMachine {
    pub name: String,
    pub output: ItemStack,
    /// Ticks per production cycle.
    pub duration: u32,
    pub state: MachineState,
}

impl SourceMachine {
    pub fn new(name: impl Into<String>, output: ItemStack, duration: u32) -> Self {
        Self {
            name: name.into(),
            output,
            duration,
            state: MachineState::Idle,
        }
    }

    /// Construct the machine with a finished batch waiting to be collected.
    pub fn ready(name: impl Into<String>, output: ItemStack, duration: u32) -> Self {
        let mut machine = Self::new(name, output.clone(), duration);
        machine.state = MachineState::Ready { output };
        machine
    }
}

impl Machine for SourceMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_produce(&self) -> bool {
        true
    }

    fn can_consume(&self) -> bool {
        false
    }

    fn take_output(&mut self) -> Option<ItemStack> {
        self.state.take_ready()
    }

    fn restore_output(&mut self, stack: ItemStack) {
        self.state = MachineState::Ready { output: stack };
    }

    fn input_request(&self) -> Option<Vec<ItemStack>> {
        None
    }

    fn start(&mut self, _inputs: Vec<ItemStack>) -> Result<(), MachineError> {
        Err(MachineError::NotAConsumer)
    }

    fn advance(&mut self, ticks: u32) {
        if self.state == MachineState::Idle {
            self.state = MachineState::Working {
                remaining: self.duration,
            };
        }
        self.state.tick_down(ticks, &self.output);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Recipe machine
// ---------------------------------------------------------------------------

/// A fixed recipe: consumes all inputs, then yields one output stack after
/// `duration` ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub inputs: Vec<ItemStack>,
    pub output: ItemStack,
    pub duration: u32,
}

/// Converts inputs into an output (furnaces, kegs, preserves jars).
#[derive(Debug, Clone)]
pub struct RecipeMachine {
    pub name: String,
    pub recipe: Recipe,
    pub state: MachineState,
}

impl RecipeMachine {
    pub fn new(name: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            name: name.into(),
            recipe,
            state: MachineState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == MachineState::Idle
    }

    pub fn is_working(&self) -> bool {
        matches!(self.state, MachineState::Working { .. })
    }
}

impl Machine for RecipeMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_produce(&self) -> bool {
        true
    }

    fn can_consume(&self) -> bool {
        true
    }

    fn take_output(&mut self) -> Option<ItemStack> {
        self.state.take_ready()
    }

    fn restore_output(&mut self, stack: ItemStack) {
        self.state = MachineState::Ready { output: stack };
    }

    fn input_request(&self) -> Option<Vec<ItemStack>> {
        self.is_idle().then(|| self.recipe.inputs.clone())
    }

    fn start(&mut self, inputs: Vec<ItemStack>) -> Result<(), MachineError> {
        if !self.is_idle() {
            return Err(MachineError::Busy);
        }
        for needed in &self.recipe.inputs {
            let supplied: u32 = inputs
                .iter()
                .filter(|s| s.item_type == needed.item_type)
                .map(|s| s.quantity)
                .sum();
            if supplied < needed.quantity {
                return Err(MachineError::InputMismatch {
                    item: needed.item_type,
                    missing: needed.quantity - supplied,
                });
            }
        }
        self.state = MachineState::Working {
            remaining: self.recipe.duration,
        };
        if self.recipe.duration == 0 {
            self.state.tick_down(0, &self.recipe.output);
        }
        Ok(())
    }

    fn advance(&mut self, ticks: u32) {
        self.state.tick_down(ticks, &self.recipe.output);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
