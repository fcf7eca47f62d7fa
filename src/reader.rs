//! # Tabular reader
//!
//! A line-oriented transaction reader: one transaction per line, items
//! separated by whitespace or commas. Stands in for `tabscan.c`'s role as
//! an external table scanner, simplified to the one record shape the CLI
//! needs (SPEC_FULL.md §4.11).

use crate::dict::SymbolTable;
use crate::error::Result;
use crate::transactions::TransactionSet;
use std::io::BufRead;

/// Reads transactions from `reader`, interning items into `dict` and
/// accumulating rows into a fresh [`TransactionSet`]. Blank lines are
/// skipped; `#`-prefixed lines are treated as comments.
pub fn read_transactions<R: BufRead>(reader: R, dict: &mut SymbolTable) -> Result<TransactionSet> {
  let mut transactions = TransactionSet::new();
  for line in reader.lines() {
    let line = line?;
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }
    let mut items: Vec<_> =
      trimmed.split(|c: char| c == ',' || c.is_whitespace()).filter(|token| !token.is_empty()).map(|token| dict.intern(token)).collect();
    if items.is_empty() {
      continue;
    }
    // Dedup before counting occurrences, so a repeated item within one line
    // contributes at most once to its frequency (used by `reorder_by_frequency`).
    items.sort_unstable();
    items.dedup();
    for &id in &items {
      dict.add_occurrence(id);
    }
    transactions.push(items);
  }
  log::debug!("read {} transactions over {} items", transactions.len(), dict.item_count());
  Ok(transactions)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn parses_whitespace_and_comma_separated_lines() {
    let input = "bread, butter\nbeer diapers\n# a comment\n\nbread beer diapers\n";
    let mut dict = SymbolTable::new();
    let ts = read_transactions(Cursor::new(input), &mut dict).unwrap();
    assert_eq!(ts.len(), 3);
    assert_eq!(dict.item_count(), 4);
  }

  #[test]
  fn skips_blank_and_comment_lines() {
    let input = "\n# comment only\n   \nbread\n";
    let mut dict = SymbolTable::new();
    let ts = read_transactions(Cursor::new(input), &mut dict).unwrap();
    assert_eq!(ts.len(), 1);
  }
}
