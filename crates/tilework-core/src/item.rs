use crate::id::ItemTypeId;
use crate::machine::Container;
use serde::{Deserialize, Serialize};

/// A stack of fungible items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }
}

/// A storage chest holding up to `capacity` items across any number of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chest {
    pub name: String,
    pub capacity: u32,
    pub stacks: Vec<ItemStack>,
}

impl Chest {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
            stacks: Vec::new(),
        }
    }

    /// Builder-style helper to pre-fill the chest. Items that do not fit are dropped.
    pub fn with_items(mut self, item_type: ItemTypeId, quantity: u32) -> Self {
        let _ = self.add(item_type, quantity);
        self
    }

    /// Add fungible items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn add(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let space = self.capacity.saturating_sub(self.total());
        let to_add = quantity.min(space);

        if to_add > 0 {
            if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack::new(item_type, to_add));
            }
        }

        quantity - to_add
    }

    /// Remove fungible items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn take(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) else {
            return 0;
        };
        let removed = quantity.min(stack.quantity);
        stack.quantity -= removed;
        self.stacks.retain(|s| s.quantity > 0);
        removed
    }

    /// Quantity of a specific item type.
    pub fn count(&self, item_type: ItemTypeId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item_type == item_type)
            .map_or(0, |s| s.quantity)
    }

    /// Total items across all types.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }
}

impl Container for Chest {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_space(&self) -> bool {
        self.total() < self.capacity
    }

    fn insert(&mut self, stack: &ItemStack) -> u32 {
        self.add(stack.item_type, stack.quantity)
    }

    fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.count(item_type)
    }

    fn remove(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        self.take(item_type, quantity)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
