//! # Extraction iterators
//!
//! Four stateful cursors over a built, (optionally filtered) [`Tree`]:
//! frequent sets, association rules, hyperedges, and groups. Grounded on
//! `ist_set`, `ist_rule`, `ist_hedge`, `ist_group` in `istree.c`.
//!
//! `sets`/`rules` borrow the tree immutably, so the borrow checker itself
//! enforces that the tree is not mutated during the iteration window.
//! `hyperedges`/`groups` mutate the tree as a side effect of evaluating
//! their additional measure (matching the source's observed skip-marking
//! behaviour) and so take `&mut self`; the mutation happens once, eagerly,
//! while the result set is assembled, not across the iterator's lifetime.

use crate::dict::ItemId;
use crate::measures;
use crate::tree::{Support, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
  pub items: Vec<ItemId>,
  pub support: u32,
  pub measure: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub body: Vec<ItemId>,
  pub head: ItemId,
  pub support: u32,
  pub confidence: f64,
  pub lift: f64,
  pub measure: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hyperedge {
  pub items: Vec<ItemId>,
  pub support: u32,
  pub avg_confidence: f64,
  pub measure: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
  pub items: Vec<ItemId>,
  pub support: u32,
  pub measure: f64,
}

pub struct SetIter<'a> {
  _tree: &'a Tree,
  queue: std::vec::IntoIter<SetItem>,
}

impl<'a> Iterator for SetIter<'a> {
  type Item = SetItem;
  fn next(&mut self) -> Option<SetItem> {
    self.queue.next()
  }
}

pub struct RuleIter<'a> {
  _tree: &'a Tree,
  queue: std::vec::IntoIter<Rule>,
}

impl<'a> Iterator for RuleIter<'a> {
  type Item = Rule;
  fn next(&mut self) -> Option<Rule> {
    self.queue.next()
  }
}

pub struct HedgeIter {
  queue: std::vec::IntoIter<Hyperedge>,
}

impl Iterator for HedgeIter {
  type Item = Hyperedge;
  fn next(&mut self) -> Option<Hyperedge> {
    self.queue.next()
  }
}

pub struct GroupIter {
  queue: std::vec::IntoIter<Group>,
}

impl Iterator for GroupIter {
  type Item = Group;
  fn next(&mut self) -> Option<Group> {
    self.queue.next()
  }
}

impl Tree {
  /// Frequent item sets of length within `[min_len, max_len]`. For
  /// `ExtraMeasure::ConfDiff` the log-deviation from the product-of-1-item-
  /// supports prior is computed along the path (`ist_set`'s `EM_DIFF`
  /// branch); all other measures leave `measure` at `0.0` for sets (the
  /// source defines additional measures only for rules/hyperedges/groups).
  pub fn sets(&self) -> SetIter<'_> {
    let min_len = self.min_len();
    let max_len = self.max_len();
    let mut out = Vec::new();
    for (items, support) in self.frequent_item_sets() {
      let len = items.len() as u32;
      if len < min_len {
        continue;
      }
      if let Some(max_len) = max_len {
        if len > max_len {
          continue;
        }
      }
      let measure = if matches!(self.extra_measure(), crate::config::ExtraMeasure::ConfDiff) {
        self.set_deviation(&items, support)
      } else {
        0.0
      };
      out.push(SetItem { items, support, measure });
    }
    SetIter { _tree: self, queue: out.into_iter() }
  }

  fn set_deviation(&self, items: &[ItemId], support: u32) -> f64 {
    let n = self.transaction_count() as f64;
    let size = items.len() as f64;
    let mut dev = (support as f64).ln();
    for &item in items {
      let item_support = match self.lookup_support(&[item]) {
        Support::Present(s) if s > 0 => s as f64,
        _ => 1.0,
      };
      dev -= item_support.ln();
    }
    (dev + (size - 1.0) * n.ln()) * 0.01 / std::f64::consts::LN_2
  }

  /// Association rules: every (set, head) pair where head is eligible to be
  /// a rule head, the body meets `min_body_support`, confidence meets
  /// `min_confidence`, and the selected additional measure meets
  /// `min_measure` (`ist_rule`).
  pub fn rules(&self) -> RuleIter<'_> {
    let min_len = self.min_len();
    let max_len = self.max_len();
    let min_confidence = self.min_confidence();
    let min_measure = self.min_measure();
    let min_body_support = self.min_body_support();
    let extra_measure = self.extra_measure();
    let n = self.transaction_count();
    let mut out = Vec::new();
    for (items, support) in self.frequent_item_sets() {
      if items.len() < 2 {
        continue;
      }
      let len = items.len() as u32;
      if len < min_len {
        continue;
      }
      if let Some(max_len) = max_len {
        if len > max_len {
          continue;
        }
      }
      for &head in &items {
        if self.appearance_of(head) == crate::dict::Appearance::Ignore || !self.appearance_of(head).may_be_head() {
          continue;
        }
        let body: Vec<ItemId> = items.iter().copied().filter(|&item| item != head).collect();
        if body.iter().any(|&item| self.appearance_of(item) == crate::dict::Appearance::HeadOnly) {
          continue;
        }
        let body_support = match self.lookup_support(&body) {
          Support::Present(s) => s,
          Support::Absent => continue,
        };
        if body_support < min_body_support {
          continue;
        }
        let confidence = support as f64 / body_support as f64;
        if confidence < min_confidence {
          continue;
        }
        let head_support = match self.lookup_support(&[head]) {
          Support::Present(s) => s,
          Support::Absent => continue,
        };
        let lift = if head_support > 0 { confidence * n as f64 / head_support as f64 } else { 0.0 };
        let measure = measures::evaluate(extra_measure, body_support, head_support, support, n);
        if measure < min_measure {
          continue;
        }
        out.push(Rule { body, head, support, confidence, lift, measure });
      }
    }
    RuleIter { _tree: self, queue: out.into_iter() }
  }

  /// Hyperedges: for each frequent set of length >= 2, average confidence
  /// across every rotation (each item in turn as head) and take the minimum
  /// additional measure across rotations. Emits when the average confidence
  /// and the minimum measure both clear their thresholds. When
  /// `min_measure < 0`, a failing candidate has its own counter marked
  /// skip, matching `ist_hedge`'s observed behaviour (Open Question 2).
  pub fn hyperedges(&mut self) -> HedgeIter {
    let min_len = self.min_len();
    let max_len = self.max_len();
    let min_confidence = self.min_confidence();
    let min_measure = self.min_measure();
    let extra_measure = self.extra_measure();
    let n = self.transaction_count();
    let mut out = Vec::new();
    for (items, support) in self.frequent_item_sets() {
      if items.len() < 2 {
        continue;
      }
      let len = items.len() as u32;
      if len < min_len {
        continue;
      }
      if let Some(max_len) = max_len {
        if len > max_len {
          continue;
        }
      }
      let mut confidences = Vec::with_capacity(items.len());
      let mut rotation_measures = Vec::with_capacity(items.len());
      let mut complete = true;
      for &head in &items {
        let body: Vec<ItemId> = items.iter().copied().filter(|&item| item != head).collect();
        let body_support = match self.lookup_support(&body) {
          Support::Present(s) if s > 0 => s,
          _ => {
            complete = false;
            break;
          }
        };
        let head_support = match self.lookup_support(&[head]) {
          Support::Present(s) => s,
          Support::Absent => 0,
        };
        confidences.push(support as f64 / body_support as f64);
        rotation_measures.push(measures::evaluate(extra_measure, body_support, head_support, support, n));
      }
      if !complete {
        continue;
      }
      let avg_confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;
      let min_rotation_measure = rotation_measures.iter().cloned().fold(f64::INFINITY, f64::min);
      let passes = avg_confidence >= min_confidence && min_rotation_measure >= min_measure.abs();
      if passes {
        out.push(Hyperedge { items, support, avg_confidence, measure: min_rotation_measure });
      } else if min_measure < 0.0 {
        if let Some((node_id, idx)) = self.locate_counter_pub(&items) {
          self.mark_counter_skip(node_id, idx);
        }
      }
    }
    HedgeIter { queue: out.into_iter() }
  }

  /// Groups: item sets visited largest-first; each set's minimum additional
  /// measure across rotations must clear `|min_measure|` to be emitted.
  /// Emitting a group marks every direct subset as skip; a set that was
  /// already marked skip by a larger dominating group has its own subsets
  /// unconditionally marked skip in turn, without being re-emitted
  /// (`ist_group`'s unconditional `_marksub(..., -1)` on the failing branch).
  pub fn groups(&mut self) -> GroupIter {
    let min_measure = self.min_measure().abs();
    let extra_measure = self.extra_measure();
    let n = self.transaction_count();
    let mut sets = self.frequent_item_sets();
    sets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    let mut out = Vec::new();
    for (items, support) in sets {
      if items.len() < 2 {
        continue;
      }
      let already_skip = match self.locate_counter_pub(&items) {
        Some((node_id, idx)) => self.counter_is_skip(node_id, idx),
        None => true,
      };
      if already_skip {
        self.mark_all_subsets_skip(&items);
        continue;
      }
      let mut min_rotation_measure = f64::INFINITY;
      let mut complete = true;
      for &head in &items {
        let body: Vec<ItemId> = items.iter().copied().filter(|&item| item != head).collect();
        let body_support = match self.lookup_support(&body) {
          Support::Present(s) => s,
          Support::Absent => {
            complete = false;
            break;
          }
        };
        let head_support = match self.lookup_support(&[head]) {
          Support::Present(s) => s,
          Support::Absent => 0,
        };
        let measure = measures::evaluate(extra_measure, body_support, head_support, support, n);
        min_rotation_measure = min_rotation_measure.min(measure);
      }
      if !complete {
        continue;
      }
      if min_rotation_measure >= min_measure {
        out.push(Group { items: items.clone(), support, measure: min_rotation_measure });
      }
      self.mark_all_subsets_skip(&items);
    }
    GroupIter { queue: out.into_iter() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ExtraMeasure, MiningConfig, RuleSupportMode, Target};
  use crate::dict::SymbolTable;
  use crate::transactions::TransactionSet;
  use crate::tree::LevelOutcome;

  fn build_market_basket() -> (SymbolTable, TransactionSet) {
    let mut dict = SymbolTable::new();
    let bread = dict.intern("bread");
    let butter = dict.intern("butter");
    let beer = dict.intern("beer");
    let diapers = dict.intern("diapers");
    let mut ts = TransactionSet::new();
    let rows = [
      vec![bread, butter],
      vec![bread, butter],
      vec![bread, butter],
      vec![bread, butter, beer],
      vec![beer, diapers],
      vec![beer, diapers],
      vec![beer, diapers],
      vec![beer, diapers],
      vec![bread, beer, diapers],
      vec![bread],
    ];
    for row in rows {
      for &item in &row {
        dict.add_occurrence(item);
      }
      ts.push(row);
    }
    (dict, ts)
  }

  fn build_tree(dict: &SymbolTable, ts: &TransactionSet, config: MiningConfig) -> Tree {
    let mut tree = Tree::new(dict, ts.len() as u32, config).unwrap();
    loop {
      for row in ts.transactions() {
        tree.count_transaction(row);
      }
      match tree.add_level().unwrap() {
        LevelOutcome::Grown(_) => continue,
        LevelOutcome::Exhausted => break,
      }
    }
    tree
  }

  #[test]
  fn s1_frequent_sets_include_bread_butter() {
    let (dict, ts) = build_market_basket();
    let config =
      MiningConfig::new(3, 0.0, Target::Sets, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly).unwrap();
    let tree = build_tree(&dict, &ts, config);
    let bread = dict.lookup("bread").unwrap();
    let butter = dict.lookup("butter").unwrap();
    let found = tree.sets().any(|s| s.items == vec![bread, butter] && s.support == 4);
    assert!(found);
  }

  #[test]
  fn s2_rule_extraction_respects_confidence_threshold() {
    let (dict, ts) = build_market_basket();
    // bread -> butter: support(bread,butter)=4, support(bread)=6, confidence = 4/6 = 0.667.
    let config = MiningConfig::new(
      2,
      0.6,
      Target::Rules,
      2,
      None,
      ExtraMeasure::None,
      0.0,
      false,
      RuleSupportMode::BodyAndHead,
    )
    .unwrap();
    let tree = build_tree(&dict, &ts, config);
    let bread = dict.lookup("bread").unwrap();
    let butter = dict.lookup("butter").unwrap();
    let rule = tree.rules().find(|r| r.body == vec![bread] && r.head == butter);
    assert!(rule.is_some());
    assert!((rule.unwrap().confidence - 4.0 / 6.0).abs() < 1e-9);
  }

  #[test]
  fn s4_maximal_filter_removes_dominated_sets_from_extraction() {
    let (dict, ts) = build_market_basket();
    let config =
      MiningConfig::new(2, 0.0, Target::MaximalSets, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
        .unwrap();
    let mut tree = build_tree(&dict, &ts, config);
    tree.filter(crate::tree::FilterMode::Maximal);
    let beer = dict.lookup("beer").unwrap();
    let diapers = dict.lookup("diapers").unwrap();
    let pair_present = tree.sets().any(|s| s.items == vec![beer, diapers]);
    assert!(pair_present);
    let singleton_beer_survives = tree.sets().any(|s| s.items == vec![beer]);
    assert!(!singleton_beer_survives, "singleton {{beer}} should be dominated by {{beer,diapers}}");
  }

  #[test]
  fn s3_closed_filter_keeps_sets_with_strictly_higher_support() {
    let (dict, ts) = build_market_basket();
    let config =
      MiningConfig::new(2, 0.0, Target::ClosedSets, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
        .unwrap();
    let mut tree = build_tree(&dict, &ts, config);
    tree.filter(crate::tree::FilterMode::Closed);
    let bread = dict.lookup("bread").unwrap();
    let butter = dict.lookup("butter").unwrap();
    // {bread} has support 6, {bread,butter} has support 4: strictly lower, so
    // {bread,butter} does not make {bread} redundant and both survive closed filtering.
    let pair_present = tree.sets().any(|s| s.items == vec![bread, butter]);
    let bread_alone_present = tree.sets().any(|s| s.items == vec![bread]);
    assert!(pair_present);
    assert!(bread_alone_present);
  }

  #[test]
  fn s5_head_only_items_never_appear_as_rule_body() {
    let mut dict = SymbolTable::new();
    let bread = dict.intern("bread");
    let butter = dict.intern("butter");
    dict.set_appearance(butter, crate::dict::Appearance::HeadOnly);
    let mut ts = TransactionSet::new();
    for _ in 0..5 {
      dict.add_occurrence(bread);
      dict.add_occurrence(butter);
      ts.push(vec![bread, butter]);
    }
    let config =
      MiningConfig::new(1, 0.0, Target::Rules, 2, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
        .unwrap();
    let tree = build_tree(&dict, &ts, config);
    assert!(tree.rules().all(|r| r.head != butter || !r.body.contains(&butter)));
    assert!(tree.rules().any(|r| r.head == butter));
    assert!(tree.rules().all(|r| r.head != bread));
  }

  #[test]
  fn s6_singleton_transaction_yields_seven_nonempty_subsets() {
    let mut dict = SymbolTable::new();
    let a = dict.intern("a");
    let b = dict.intern("b");
    let c = dict.intern("c");
    let mut ts = TransactionSet::new();
    for item in [a, b, c] {
      dict.add_occurrence(item);
    }
    ts.push(vec![a, b, c]);
    let config =
      MiningConfig::new(1, 0.0, Target::Sets, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly).unwrap();
    let tree = build_tree(&dict, &ts, config);
    let all: Vec<SetItem> = tree.sets().collect();
    assert_eq!(all.len(), 7); // 2^3 - 1 nonempty subsets of {a,b,c}
    assert!(all.iter().all(|s| s.support == 1));
  }
}
