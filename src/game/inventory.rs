//! Slot storage for the main grid and the hotbar.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub count: u32,
    pub max_stack: u32,
    pub icon: String,
}

impl Item {
    pub fn new(id: &str, name: &str, count: u32, max_stack: u32, icon: &str) -> Self {
        Self { id: id.into(), name: name.into(), count, max_stack, icon: icon.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotList {
    Main,
    Hotbar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub list: SlotList,
    pub index: usize,
}

impl SlotRef {
    pub fn main(index: usize) -> Self {
        Self { list: SlotList::Main, index }
    }

    pub fn hotbar(index: usize) -> Self {
        Self { list: SlotList::Hotbar, index }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("slot {index} is out of range for {list:?} ({len} slots)")]
    OutOfRange { list: SlotList, index: usize, len: usize },
    #[error("slot {0:?} is empty")]
    EmptySlot(SlotRef),
    #[error("stack in {0:?} is too small to split")]
    NothingToSplit(SlotRef),
    #[error("no free slot in {0:?}")]
    NoFreeSlot(SlotList),
}

pub type Slot = Option<Item>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub main: Vec<Slot>,
    pub hotbar: Vec<Slot>,
}

impl Inventory {
    pub fn new(main_slots: usize, hotbar_slots: usize) -> Self {
        Self { main: vec![None; main_slots], hotbar: vec![None; hotbar_slots] }
    }

    /// The loadout a fresh game starts with.
    pub fn starting(main_slots: usize, hotbar_slots: usize) -> Self {
        let mut inv = Self::new(main_slots, hotbar_slots);
        let main = [
            Item::new("wood", "Wood Log", 5, 64, "🪵"),
            Item::new("stone", "Stone", 2, 64, "🪨"),
            Item::new("berry", "Berry", 12, 64, "🍒"),
        ];
        for (slot, item) in inv.main.iter_mut().zip(main) {
            *slot = Some(item);
        }
        if let Some(slot) = inv.hotbar.first_mut() {
            *slot = Some(Item::new("axe", "Stone Axe", 1, 1, "🪓"));
        }
        inv
    }

    pub fn clear(&mut self) {
        self.main.iter_mut().for_each(|s| *s = None);
        self.hotbar.iter_mut().for_each(|s| *s = None);
    }

    fn list(&self, list: SlotList) -> &Vec<Slot> {
        match list {
            SlotList::Main => &self.main,
            SlotList::Hotbar => &self.hotbar,
        }
    }

    fn list_mut(&mut self, list: SlotList) -> &mut Vec<Slot> {
        match list {
            SlotList::Main => &mut self.main,
            SlotList::Hotbar => &mut self.hotbar,
        }
    }

    fn check(&self, slot: SlotRef) -> Result<(), InventoryError> {
        let len = self.list(slot.list).len();
        if slot.index >= len {
            return Err(InventoryError::OutOfRange { list: slot.list, index: slot.index, len });
        }
        Ok(())
    }

    pub fn get(&self, slot: SlotRef) -> Option<&Item> {
        self.list(slot.list).get(slot.index).and_then(Option::as_ref)
    }

    fn take(&mut self, slot: SlotRef) -> Slot {
        self.list_mut(slot.list)[slot.index].take()
    }

    fn put(&mut self, slot: SlotRef, item: Slot) {
        self.list_mut(slot.list)[slot.index] = item;
    }

    /// Move the stack in `from` onto `to`. Stacks of the same item merge up to
    /// their max stack, leaving any remainder behind; anything else swaps.
    pub fn move_item(&mut self, from: SlotRef, to: SlotRef) -> Result<(), InventoryError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Ok(());
        }
        let Some(mut moving) = self.take(from) else {
            return Err(InventoryError::EmptySlot(from));
        };
        match self.take(to) {
            Some(mut target) if target.id == moving.id && target.count < target.max_stack => {
                let moved = moving.count.min(target.max_stack - target.count);
                target.count += moved;
                moving.count -= moved;
                self.put(to, Some(target));
                self.put(from, (moving.count > 0).then_some(moving));
            }
            displaced => {
                self.put(to, Some(moving));
                self.put(from, displaced);
            }
        }
        Ok(())
    }

    /// Move half of a stack (rounded down) into the first free slot of the
    /// same list. Returns where the new stack landed.
    pub fn split(&mut self, slot: SlotRef) -> Result<SlotRef, InventoryError> {
        self.check(slot)?;
        let count = match self.get(slot) {
            None => return Err(InventoryError::EmptySlot(slot)),
            Some(item) if item.count < 2 => return Err(InventoryError::NothingToSplit(slot)),
            Some(item) => item.count,
        };
        let free = self
            .list(slot.list)
            .iter()
            .position(Option::is_none)
            .ok_or(InventoryError::NoFreeSlot(slot.list))?;

        let half = count / 2;
        let list = self.list_mut(slot.list);
        let mut new_stack = None;
        if let Some(item) = list[slot.index].as_mut() {
            item.count -= half;
            new_stack = Some(Item { count: half, ..item.clone() });
        }
        list[free] = new_stack;
        Ok(SlotRef { list: slot.list, index: free })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv() -> Inventory {
        Inventory::starting(20, 5)
    }

    #[test]
    fn starting_loadout() {
        let inv = inv();
        assert_eq!(inv.get(SlotRef::main(0)).unwrap().name, "Wood Log");
        assert_eq!(inv.get(SlotRef::main(2)).unwrap().count, 12);
        assert!(inv.get(SlotRef::main(3)).is_none());
        let axe = inv.get(SlotRef::hotbar(0)).unwrap();
        assert_eq!((axe.id.as_str(), axe.max_stack), ("axe", 1));
    }

    #[test]
    fn move_within_and_across_lists_swaps() {
        let mut inv = inv();
        inv.move_item(SlotRef::main(0), SlotRef::main(1)).unwrap();
        assert_eq!(inv.get(SlotRef::main(0)).unwrap().id, "stone");
        assert_eq!(inv.get(SlotRef::main(1)).unwrap().id, "wood");

        inv.move_item(SlotRef::hotbar(0), SlotRef::main(5)).unwrap();
        assert!(inv.get(SlotRef::hotbar(0)).is_none());
        assert_eq!(inv.get(SlotRef::main(5)).unwrap().id, "axe");

        inv.move_item(SlotRef::main(2), SlotRef::main(5)).unwrap();
        assert_eq!(inv.get(SlotRef::main(2)).unwrap().id, "axe");
        assert_eq!(inv.get(SlotRef::main(5)).unwrap().id, "berry");
    }

    #[test]
    fn same_slot_is_a_no_op_and_empty_source_errors() {
        let mut inv = inv();
        let before = inv.clone();
        inv.move_item(SlotRef::main(0), SlotRef::main(0)).unwrap();
        assert_eq!(inv, before);
        assert_eq!(
            inv.move_item(SlotRef::main(7), SlotRef::main(0)),
            Err(InventoryError::EmptySlot(SlotRef::main(7)))
        );
        assert!(matches!(
            inv.move_item(SlotRef::hotbar(5), SlotRef::main(0)),
            Err(InventoryError::OutOfRange { index: 5, len: 5, .. })
        ));
    }

    #[test]
    fn matching_stacks_merge_up_to_max() {
        let mut inv = Inventory::new(4, 1);
        inv.main[0] = Some(Item::new("berry", "Berry", 40, 64, "🍒"));
        inv.main[1] = Some(Item::new("berry", "Berry", 30, 64, "🍒"));
        inv.move_item(SlotRef::main(0), SlotRef::main(1)).unwrap();
        assert_eq!(inv.main[1].as_ref().unwrap().count, 64);
        assert_eq!(inv.main[0].as_ref().unwrap().count, 6);

        inv.main[2] = Some(Item::new("berry", "Berry", 6, 64, "🍒"));
        inv.move_item(SlotRef::main(0), SlotRef::main(2)).unwrap();
        assert!(inv.main[0].is_none());
        assert_eq!(inv.main[2].as_ref().unwrap().count, 12);
    }

    #[test]
    fn split_moves_half_into_first_free_slot() {
        let mut inv = inv();
        let landed = inv.split(SlotRef::main(2)).unwrap();
        assert_eq!(landed, SlotRef::main(3));
        assert_eq!(inv.get(SlotRef::main(2)).unwrap().count, 6);
        assert_eq!(inv.get(SlotRef::main(3)).unwrap().count, 6);

        inv.split(SlotRef::main(0)).unwrap();
        assert_eq!(inv.get(SlotRef::main(0)).unwrap().count, 3);
        assert_eq!(inv.get(SlotRef::main(4)).unwrap().count, 2);
    }

    #[test]
    fn split_errors() {
        let mut inv = inv();
        assert_eq!(inv.split(SlotRef::hotbar(0)), Err(InventoryError::NothingToSplit(SlotRef::hotbar(0))));
        assert_eq!(inv.split(SlotRef::main(9)), Err(InventoryError::EmptySlot(SlotRef::main(9))));

        let mut full = Inventory::new(2, 0);
        full.main[0] = Some(Item::new("stone", "Stone", 4, 64, "🪨"));
        full.main[1] = Some(Item::new("wood", "Wood Log", 1, 64, "🪵"));
        assert_eq!(full.split(SlotRef::main(0)), Err(InventoryError::NoFreeSlot(SlotList::Main)));
    }

    #[test]
    fn clear_empties_everything() {
        let mut inv = inv();
        inv.clear();
        assert!(inv.main.iter().chain(&inv.hotbar).all(Option::is_none));
        assert_eq!(inv.main.len(), 20);
    }
}
