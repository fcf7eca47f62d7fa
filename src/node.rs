//! # Node store
//!
//! A tree level is an arena (`Vec<Node>`); nodes reference each other by
//! stable `(level, index)` handles rather than raw pointers, since levels
//! are appended but never reallocated in place once built. Grounded in
//! `ISNODE` (`istree.h`) and the dense/sparse layout decision in `_child()`
//! (`istree.c`, `2*n>=3*k`).

use crate::dict::ItemId;

/// Stable handle to a node: its level and index within that level's arena.
/// Never invalidated once issued, since levels only grow by appending new
/// levels, not by mutating existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
  pub(crate) level: usize,
  pub(crate) index: usize,
}

impl NodeId {
  pub fn level(self) -> usize {
    self.level
  }

  pub(crate) fn root() -> NodeId {
    NodeId { level: 0, index: 0 }
  }
}

/// One item's running count at a node, plus its closed/maximal-filter
/// marking bit. Distinct from [`Children`]'s `subtree_skip`: this bit
/// governs whether the *set itself* is reported, the other whether its
/// *descendants* are worth counting at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter {
  pub support: u32,
  pub skip: bool,
}

/// Either a dense, offset-indexed run of counters (used when the candidate
/// items are a contiguous-enough range) or a sorted-identifier map searched
/// by binary search. The choice is fixed at construction time and never
/// revisited; see [`crate::tree::Tree`]'s `2*n>=3*k` threshold.
#[derive(Debug, Clone)]
pub enum Layout {
  Dense { offset: u32, counters: Vec<Counter> },
  Sparse { ids: Vec<ItemId>, counters: Vec<Counter> },
}

impl Layout {
  pub fn len(&self) -> usize {
    match self {
      Layout::Dense { counters, .. } => counters.len(),
      Layout::Sparse { counters, .. } => counters.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Looks up the counter slot for `item`, if this node has one.
  pub fn find(&self, item: ItemId) -> Option<usize> {
    match self {
      Layout::Dense { offset, counters } => {
        if item < *offset {
          return None;
        }
        let i = (item - offset) as usize;
        if i < counters.len() {
          Some(i)
        } else {
          None
        }
      }
      Layout::Sparse { ids, .. } => ids.binary_search(&item).ok(),
    }
  }

  pub fn counter(&self, i: usize) -> &Counter {
    match self {
      Layout::Dense { counters, .. } => &counters[i],
      Layout::Sparse { counters, .. } => &counters[i],
    }
  }

  pub fn counter_mut(&mut self, i: usize) -> &mut Counter {
    match self {
      Layout::Dense { counters, .. } => &mut counters[i],
      Layout::Sparse { counters, .. } => &mut counters[i],
    }
  }

  /// The item identifier a given counter slot corresponds to.
  pub fn item_at(&self, i: usize) -> ItemId {
    match self {
      Layout::Dense { offset, .. } => offset + i as ItemId,
      Layout::Sparse { ids, .. } => ids[i],
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Counter)> + '_ {
    (0..self.len()).map(move |i| (self.item_at(i), self.counter(i)))
  }
}

/// A node's child section, built only once every counter that will ever get
/// a child has one (after a level's `add_level` pass). `None` covers both
/// "not yet extended" and "extended, but no child qualified".
///
/// Diverges intentionally from `istree.c`'s extra "single identifier map
/// reused from the counter section" optimisation: every sparse child list
/// here is its own compact `(ids, children)` pair, sized to exactly the
/// children that were created. This only changes memory footprint, not
/// behaviour, and isn't covered by any testable property.
#[derive(Debug, Clone)]
pub enum Children {
  None,
  Dense { offset: u32, subtree_skip: bool, children: Vec<Option<NodeId>> },
  Sparse { ids: Vec<ItemId>, subtree_skip: bool, children: Vec<NodeId> },
}

impl Children {
  pub fn subtree_skip(&self) -> bool {
    match self {
      Children::None => true,
      Children::Dense { subtree_skip, .. } => *subtree_skip,
      Children::Sparse { subtree_skip, .. } => *subtree_skip,
    }
  }

  pub fn set_subtree_skip(&mut self, value: bool) {
    match self {
      Children::None => {}
      Children::Dense { subtree_skip, .. } => *subtree_skip = value,
      Children::Sparse { subtree_skip, .. } => *subtree_skip = value,
    }
  }

  pub fn find(&self, item: ItemId) -> Option<NodeId> {
    match self {
      Children::None => None,
      Children::Dense { offset, children, .. } => {
        if item < *offset {
          return None;
        }
        children.get((item - offset) as usize).copied().flatten()
      }
      Children::Sparse { ids, children, .. } => ids.binary_search(&item).ok().map(|i| children[i]),
    }
  }

  pub fn iter(&self) -> Box<dyn Iterator<Item = (ItemId, NodeId)> + '_> {
    match self {
      Children::None => Box::new(std::iter::empty()),
      Children::Dense { offset, children, .. } => {
        Box::new(children.iter().enumerate().filter_map(move |(i, c)| c.map(|id| (offset + i as ItemId, id))))
      }
      Children::Sparse { ids, children, .. } => Box::new(ids.iter().copied().zip(children.iter().copied())),
    }
  }
}

/// One node of the item-set prefix tree: the path from the root to this
/// node (exclusive of the root's empty item) denotes one candidate item
/// set; `layout` holds one counter per item that could extend it.
#[derive(Debug, Clone)]
pub struct Node {
  /// Item id of the last element on this node's path; unused (0) at the root.
  pub last_item: ItemId,
  /// True if any item on the path from the root to here (inclusive) is
  /// `Appearance::HeadOnly` — such a set can never itself be a rule body,
  /// only ever extended for head placement.
  pub head_only_on_path: bool,
  pub parent: Option<NodeId>,
  pub layout: Layout,
  pub children: Children,
}

impl Node {
  pub fn new(last_item: ItemId, head_only_on_path: bool, parent: Option<NodeId>, layout: Layout) -> Self {
    Node { last_item, head_only_on_path, parent, layout, children: Children::None }
  }

  pub fn depth_items_len(&self) -> usize {
    self.layout.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dense_layout_finds_by_offset() {
    let layout = Layout::Dense { offset: 5, counters: vec![Counter::default(); 3] };
    assert_eq!(layout.find(5), Some(0));
    assert_eq!(layout.find(7), Some(2));
    assert_eq!(layout.find(4), None);
    assert_eq!(layout.find(8), None);
  }

  #[test]
  fn sparse_layout_finds_by_binary_search() {
    let layout = Layout::Sparse { ids: vec![2, 9, 40], counters: vec![Counter::default(); 3] };
    assert_eq!(layout.find(9), Some(1));
    assert_eq!(layout.find(10), None);
  }

  #[test]
  fn children_none_reports_subtree_skip() {
    assert!(Children::None.subtree_skip());
  }
}
