//! # Error types
//!
//! Mirrors the error surface `istree.c` exposes to its caller: configuration
//! problems are rejected before a tree is built, allocation failures during
//! level growth roll the tree back to its previous height, and I/O errors are
//! confined to the tabular reader. The core tree never fails once built:
//! counting and extraction are total.

use std::io;

/// Errors surfaced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
  /// Raised at [`crate::config::MiningConfig`] construction time. The tree is never built.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// Raised from [`crate::tree::Tree::add_level`] when growing a level's storage could not
  /// acquire the memory it needed. The level under construction is rolled back; the tree
  /// remains valid at its previous height.
  #[error("allocation failure while growing the item-set tree")]
  Allocation,

  /// Raised only by the tabular reader, never by the core tree.
  #[error("I/O error reading transactions: {0}")]
  Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MiningError>;
