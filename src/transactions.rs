//! # Transaction sources
//!
//! The tree never owns a transaction database; it consumes one through
//! [`TransactionSource`] (for the flat counting descent) or
//! [`TransactionTreeNode`] (for the shared-prefix counting descent). Both
//! concrete implementations here are grounded in `tract.c`'s `TASET`/`TATREE`.

use crate::dict::ItemId;
use std::collections::HashMap;

/// A flat, unordered collection of transactions, each a sorted, deduplicated
/// item-id list.
pub trait TransactionSource {
  fn transactions(&self) -> Box<dyn Iterator<Item = &[ItemId]> + '_>;
  fn transaction_count(&self) -> u32;
}

/// Concrete `TransactionSource`: an owned `Vec` of sorted, deduplicated
/// item-id rows, grounded in `TASET`/`ta_sort`.
#[derive(Debug, Default, Clone)]
pub struct TransactionSet {
  rows: Vec<Vec<ItemId>>,
}

impl TransactionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a transaction, sorting and deduplicating its items in place.
  pub fn push(&mut self, mut items: Vec<ItemId>) {
    items.sort_unstable();
    items.dedup();
    self.rows.push(items);
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Builds the equivalent shared-prefix [`TransactionTree`] for faster
  /// repeated counting descents, grounded in `tat_create`.
  pub fn build_prefix_tree(&self) -> TransactionTree {
    TransactionTree::build(&self.rows)
  }
}

impl TransactionSource for TransactionSet {
  fn transactions(&self) -> Box<dyn Iterator<Item = &[ItemId]> + '_> {
    Box::new(self.rows.iter().map(|row| row.as_slice()))
  }

  fn transaction_count(&self) -> u32 {
    self.rows.len() as u32
  }
}

/// A node in a shared-prefix transaction tree: either an internal node with
/// children keyed by item id, or a leaf run of items, mirroring `TATREE`'s
/// sign-discriminated `child_count` (`>0`: internal, `<0`: `-n` leaf items
/// follow, `0`: empty). An internal node additionally carries an `end_count`:
/// a transaction whose path ends exactly at that prefix even though longer
/// transactions share it and continue past it (e.g. `{bread}` and
/// `{bread,butter}` both present), so the shorter one is never dropped.
pub trait TransactionTreeNode {
  fn max_depth(&self) -> u32;
  fn child_count(&self) -> i32;
  fn child(&self, i: usize) -> &dyn TransactionTreeNode;
  fn item(&self, i: usize) -> ItemId;
  fn occurrence_count(&self) -> u32;
  fn leaf_items(&self) -> &[ItemId];
  /// Occurrences of a transaction terminating exactly at this node. Always
  /// `0` on a `Leaf`, whose own termination is already `occurrence_count`.
  fn end_count(&self) -> u32;
}

/// Concrete, owned shared-prefix transaction tree. Internal nodes are split
/// by first-remaining-item; identical suffixes collapse into one leaf run
/// with an aggregated occurrence count.
#[derive(Debug, Clone)]
pub enum TatNode {
  Internal { max_depth: u32, children: Vec<(ItemId, TatNode)>, end_count: u32 },
  Leaf { items: Vec<ItemId>, count: u32 },
}

impl TatNode {
  fn build(rows: &[&[ItemId]]) -> TatNode {
    // Rows already out of items are transactions ending at this prefix;
    // tally them instead of dropping them on `split_first`.
    let end_count = rows.iter().filter(|r| r.is_empty()).count() as u32;
    let remaining: Vec<&[ItemId]> = rows.iter().copied().filter(|r| !r.is_empty()).collect();

    if remaining.is_empty() {
      return TatNode::Leaf { items: Vec::new(), count: end_count };
    }
    // Nothing ends here and every longer row shares the same suffix: collapse
    // to a single leaf run.
    if end_count == 0 && remaining.iter().all(|r| *r == remaining[0]) {
      return TatNode::Leaf { items: remaining[0].to_vec(), count: remaining.len() as u32 };
    }
    let mut groups: HashMap<ItemId, Vec<&[ItemId]>> = HashMap::new();
    for &row in &remaining {
      let (&first, rest) = row.split_first().expect("empty rows filtered out above");
      groups.entry(first).or_default().push(rest);
    }
    let mut children: Vec<(ItemId, TatNode)> =
      groups.into_iter().map(|(item, rest_rows)| (item, TatNode::build(&rest_rows))).collect();
    children.sort_by_key(|(item, _)| *item);
    let max_depth = 1 + children.iter().map(|(_, child)| child.max_depth()).max().unwrap_or(0);
    TatNode::Internal { max_depth, children, end_count }
  }
}

impl TransactionTreeNode for TatNode {
  fn max_depth(&self) -> u32 {
    match self {
      TatNode::Internal { max_depth, .. } => *max_depth,
      TatNode::Leaf { .. } => 0,
    }
  }

  fn child_count(&self) -> i32 {
    match self {
      TatNode::Internal { children, .. } => children.len() as i32,
      TatNode::Leaf { items, .. } => -(items.len() as i32),
    }
  }

  fn child(&self, i: usize) -> &dyn TransactionTreeNode {
    match self {
      TatNode::Internal { children, .. } => &children[i].1,
      TatNode::Leaf { .. } => panic!("child() called on a leaf TatNode"),
    }
  }

  fn item(&self, i: usize) -> ItemId {
    match self {
      TatNode::Internal { children, .. } => children[i].0,
      TatNode::Leaf { items, .. } => items[i],
    }
  }

  fn occurrence_count(&self) -> u32 {
    match self {
      TatNode::Internal { .. } => 0,
      TatNode::Leaf { count, .. } => *count,
    }
  }

  fn leaf_items(&self) -> &[ItemId] {
    match self {
      TatNode::Internal { .. } => &[],
      TatNode::Leaf { items, .. } => items,
    }
  }

  fn end_count(&self) -> u32 {
    match self {
      TatNode::Internal { end_count, .. } => *end_count,
      TatNode::Leaf { .. } => 0,
    }
  }
}

/// Owning root of a [`TatNode`] tree.
#[derive(Debug, Clone)]
pub struct TransactionTree {
  root: TatNode,
}

impl TransactionTree {
  fn build(rows: &[Vec<ItemId>]) -> Self {
    let refs: Vec<&[ItemId]> = rows.iter().map(|r| r.as_slice()).collect();
    let root = TatNode::build(&refs);
    TransactionTree { root }
  }

  pub fn root(&self) -> &dyn TransactionTreeNode {
    &self.root
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_flat_rows_and_iterates() {
    let mut ts = TransactionSet::new();
    ts.push(vec![3, 1, 2, 1]);
    ts.push(vec![1, 2]);
    assert_eq!(ts.len(), 2);
    let rows: Vec<&[ItemId]> = ts.transactions().collect();
    assert_eq!(rows[0], &[1, 2, 3]);
    assert_eq!(rows[1], &[1, 2]);
  }

  #[test]
  fn prefix_tree_shares_common_prefixes() {
    let mut ts = TransactionSet::new();
    ts.push(vec![1, 2, 3]);
    ts.push(vec![1, 2, 3]);
    ts.push(vec![1, 2, 4]);
    let tat = ts.build_prefix_tree();
    let root = tat.root();
    assert_eq!(root.child_count(), 1); // single branch on item 1
    let branch_1 = root.child(0);
    assert_eq!(branch_1.child_count(), 1); // single branch on item 2
    let branch_2 = branch_1.child(0);
    assert_eq!(branch_2.child_count(), 2); // splits on item 3 vs item 4
  }

  #[test]
  fn prefix_tree_aggregates_identical_transactions() {
    let mut ts = TransactionSet::new();
    ts.push(vec![1, 2]);
    ts.push(vec![1, 2]);
    ts.push(vec![1, 2]);
    let tat = ts.build_prefix_tree();
    // Every row is identical, so `build` collapses straight to a root leaf run.
    let root = tat.root();
    assert_eq!(root.child_count(), -2);
    assert_eq!(root.occurrence_count(), 3);
    assert_eq!(root.leaf_items(), &[1, 2]);
  }

  #[test]
  fn prefix_tree_keeps_transaction_that_is_a_prefix_of_another() {
    let mut ts = TransactionSet::new();
    ts.push(vec![1]);
    ts.push(vec![1, 2]);
    let tat = ts.build_prefix_tree();
    let root = tat.root();
    assert_eq!(root.child_count(), 1);
    let branch_1 = root.child(0);
    assert_eq!(branch_1.end_count(), 1); // the lone `{1}` transaction
    assert_eq!(branch_1.child_count(), -1);
    assert_eq!(branch_1.occurrence_count(), 1); // the `{1,2}` transaction
    assert_eq!(branch_1.leaf_items(), &[2]);
  }

  fn count_flat(ts: &TransactionSet) -> HashMap<Vec<ItemId>, u32> {
    let mut counts = HashMap::new();
    for row in ts.transactions() {
      *counts.entry(row.to_vec()).or_insert(0) += 1;
    }
    counts
  }

  fn count_via_tree(node: &dyn TransactionTreeNode, prefix: &mut Vec<ItemId>, out: &mut HashMap<Vec<ItemId>, u32>) {
    if node.end_count() > 0 {
      out.insert(prefix.clone(), node.end_count());
    }
    let child_count = node.child_count();
    if child_count <= 0 {
      let count = node.occurrence_count();
      if count > 0 {
        let mut items = prefix.clone();
        items.extend_from_slice(node.leaf_items());
        out.insert(items, count);
      }
      return;
    }
    for i in 0..child_count as usize {
      prefix.push(node.item(i));
      count_via_tree(node.child(i), prefix, out);
      prefix.pop();
    }
  }

  #[test]
  fn transaction_tree_equivalence() {
    // A DB where one transaction is a proper prefix of another, directly
    // exercising the case the flat-row counting and the shared-prefix tree
    // counting must agree on.
    let mut ts = TransactionSet::new();
    ts.push(vec![1]);
    ts.push(vec![1, 2]);
    ts.push(vec![1, 2]);
    ts.push(vec![1, 3]);

    let flat = count_flat(&ts);
    let mut via_tree = HashMap::new();
    let tat = ts.build_prefix_tree();
    count_via_tree(tat.root(), &mut Vec::new(), &mut via_tree);

    assert_eq!(flat, via_tree);
  }
}
