//! Level-wise Apriori frequent item set / association rule miner over an
//! item-set prefix tree.
//!
//! The tree ([`tree::Tree`]) is the hard part: a dense/sparse hybrid
//! counter store, grown one level at a time with full downward-closure
//! pruning, counted by descent, and read back out through the iterators in
//! [`extract`]. Everything else in this crate — the item dictionary, the
//! transaction containers, the statistics helpers, the reader and CLI — is
//! ambient plumbing to make the tree runnable end to end.

pub mod config;
pub mod dict;
pub mod error;
pub mod extract;
pub mod measures;
pub mod node;
pub mod reader;
pub mod stats;
pub mod transactions;
pub mod tree;

pub use config::{ExtraMeasure, MiningConfig, RuleSupportMode, Target};
pub use dict::{Appearance, ItemDictionary, ItemId, SymbolTable};
pub use error::{MiningError, Result};
pub use extract::{Group, Hyperedge, Rule, SetItem};
pub use node::NodeId;
pub use transactions::{TransactionSet, TransactionSource, TransactionTree, TransactionTreeNode};
pub use tree::{FilterMode, LevelOutcome, Support, Tree};

/// Grows `tree` by repeatedly counting `transactions` and appending a level
/// until no further level is added, the convenience loop every caller
/// (library or CLI) runs before extraction.
pub fn mine_to_fixed_point(tree: &mut Tree, transactions: &TransactionSet) -> Result<()> {
  loop {
    for row in transactions.transactions() {
      tree.count_transaction(row);
    }
    match tree.add_level()? {
      LevelOutcome::Grown(n) => log::trace!("mine_to_fixed_point: grew level with {n} nodes"),
      LevelOutcome::Exhausted => break,
    }
  }
  Ok(())
}
