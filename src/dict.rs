//! # Item dictionary
//!
//! The core tree consumes items only through [`ItemDictionary`]; it never
//! writes through it. `SymbolTable` is a complete, concrete implementation
//! that interns item names into dense identifiers, grounded in `tract.c`'s
//! `ITEM`/`ITEMSET`/`NIMAP` handling.

use std::collections::HashMap;

/// Dense, zero-based item identifier.
pub type ItemId = u32;

/// Per-item appearance tag, restricting how an item may be used when
/// extending sets or forming rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
  /// The item is excluded from mining entirely.
  Ignore,
  /// The item may appear only in a rule's body (antecedent).
  BodyOnly,
  /// The item may appear only as a rule's head (consequent).
  HeadOnly,
  /// The item may appear in either position (the default).
  Both,
}

impl Appearance {
  pub fn may_be_head(self) -> bool {
    matches!(self, Appearance::HeadOnly | Appearance::Both)
  }
}

/// Read-only view of the item universe the core consumes.
pub trait ItemDictionary {
  /// Number of distinct items, `I`. Identifiers lie in `[0, item_count())`.
  fn item_count(&self) -> u32;
  fn appearance(&self, item: ItemId) -> Appearance;
  /// Number of transactions containing `item` (its 1-item support).
  fn frequency(&self, item: ItemId) -> u32;
}

/// A simple name-to-identifier interning table, in first-seen order.
///
/// Item order is significant: the tree expects identifiers assigned in a
/// frequency-based order (rarest first) so that the first child of any node
/// is the rarest extension. Call [`SymbolTable::reorder_by_frequency`] after
/// all items and frequencies are known (i.e. after a full pass over the
/// transaction database) and before handing the table to [`crate::tree::Tree::new`].
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
  names: Vec<String>,
  ids_by_name: HashMap<String, ItemId>,
  frequencies: Vec<u32>,
  appearances: Vec<Appearance>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Interns `name`, returning its identifier (assigning a fresh one on first sight).
  pub fn intern(&mut self, name: &str) -> ItemId {
    if let Some(&id) = self.ids_by_name.get(name) {
      return id;
    }
    let id = self.names.len() as ItemId;
    self.names.push(name.to_string());
    self.ids_by_name.insert(name.to_string(), id);
    self.frequencies.push(0);
    self.appearances.push(Appearance::Both);
    id
  }

  pub fn name(&self, item: ItemId) -> &str {
    &self.names[item as usize]
  }

  pub fn lookup(&self, name: &str) -> Option<ItemId> {
    self.ids_by_name.get(name).copied()
  }

  pub fn set_appearance(&mut self, item: ItemId, appearance: Appearance) {
    self.appearances[item as usize] = appearance;
  }

  pub fn add_occurrence(&mut self, item: ItemId) {
    self.frequencies[item as usize] += 1;
  }

  /// Reassigns identifiers in ascending order of frequency (ties broken by
  /// first-seen order), returning the old-id -> new-id permutation so the
  /// caller can recode already-collected transactions.
  pub fn reorder_by_frequency(&mut self) -> Vec<ItemId> {
    let n = self.names.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| self.frequencies[a].cmp(&self.frequencies[b]).then(a.cmp(&b)));
    let mut old_to_new = vec![0u32; n];
    for (new_id, &old_id) in order.iter().enumerate() {
      old_to_new[old_id] = new_id as ItemId;
    }
    let mut names = vec![String::new(); n];
    let mut frequencies = vec![0u32; n];
    let mut appearances = vec![Appearance::Both; n];
    for (old_id, &new_id) in old_to_new.iter().enumerate() {
      names[new_id as usize] = self.names[old_id].clone();
      frequencies[new_id as usize] = self.frequencies[old_id];
      appearances[new_id as usize] = self.appearances[old_id];
    }
    self.names = names;
    self.frequencies = frequencies;
    self.appearances = appearances;
    self.ids_by_name = self.names.iter().enumerate().map(|(id, name)| (name.clone(), id as ItemId)).collect();
    old_to_new
  }
}

impl ItemDictionary for SymbolTable {
  fn item_count(&self) -> u32 {
    self.names.len() as u32
  }

  fn appearance(&self, item: ItemId) -> Appearance {
    self.appearances[item as usize]
  }

  fn frequency(&self, item: ItemId) -> u32 {
    self.frequencies[item as usize]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interns_stably() {
    let mut st = SymbolTable::new();
    let a = st.intern("bread");
    let b = st.intern("butter");
    assert_eq!(st.intern("bread"), a);
    assert_ne!(a, b);
    assert_eq!(st.name(a), "bread");
  }

  #[test]
  fn reorders_by_ascending_frequency() {
    let mut st = SymbolTable::new();
    let bread = st.intern("bread");
    let butter = st.intern("butter");
    let beer = st.intern("beer");
    for _ in 0..4 {
      st.add_occurrence(bread);
    }
    for _ in 0..3 {
      st.add_occurrence(butter);
    }
    for _ in 0..1 {
      st.add_occurrence(beer);
    }
    let map = st.reorder_by_frequency();
    // beer (freq 1) should now sort first, bread (freq 4) last.
    assert_eq!(map[beer as usize], 0);
    assert_eq!(map[bread as usize], 2);
    assert_eq!(st.frequency(0), 1);
    assert_eq!(st.frequency(2), 4);
  }
}
