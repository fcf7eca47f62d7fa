//! # Evaluation measures
//!
//! The seven additional rule/hyperedge/group evaluation functions, ported
//! from the `EVALFN` table in `istree.c` (`_none`, `_diff`, `_quot`, `_aimp`,
//! `_info`, `_chi2`, `_pval`). Each takes the four raw counts a 2x2
//! contingency table is built from — `body_support`, `head_support`,
//! `both_support` (the rule's own support) and `n` (total transactions) —
//! and returns a single real-valued score comparable against `min_measure`.

use crate::config::ExtraMeasure;
use crate::stats;

/// The four cells of the body/head contingency table, derived once and
/// shared by the measures that need more than the plain confidence ratio.
struct Contingency {
  a: f64, // both
  b: f64, // body, not head
  c: f64, // head, not body
  d: f64, // neither
  n: f64,
}

impl Contingency {
  fn new(body_support: u32, head_support: u32, both_support: u32, n: u32) -> Self {
    let n = n as f64;
    let body = body_support as f64;
    let head = head_support as f64;
    let both = both_support as f64;
    Contingency { a: both, b: body - both, c: head - both, d: n - body - head + both, n }
  }

  fn expected(&self, row_total: f64, col_total: f64) -> f64 {
    if self.n == 0.0 {
      0.0
    } else {
      row_total * col_total / self.n
    }
  }

  /// `(observed, expected)` pairs for all four cells.
  fn cells(&self) -> [(f64, f64); 4] {
    let body = self.a + self.b;
    let head = self.a + self.c;
    let not_body = self.n - body;
    let not_head = self.n - head;
    [
      (self.a, self.expected(body, head)),
      (self.b, self.expected(body, not_head)),
      (self.c, self.expected(not_body, head)),
      (self.d, self.expected(not_body, not_head)),
    ]
  }

  /// Pearson chi-squared statistic over the table.
  fn chi_squared(&self) -> f64 {
    self.cells().iter().filter(|(_, e)| *e > 0.0).map(|(o, e)| (o - e).powi(2) / e).sum()
  }
}

/// `EM_NONE`: no additional filtering; always passes.
pub fn none(_body_support: u32, _head_support: u32, _both_support: u32, _n: u32) -> f64 {
  0.0
}

/// `EM_DIFF`: confidence minus the head's prior probability.
pub fn conf_diff(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if body_support == 0 || n == 0 {
    return 0.0;
  }
  let confidence = both_support as f64 / body_support as f64;
  let prior = head_support as f64 / n as f64;
  confidence - prior
}

/// `EM_QUOT`: confidence over the head's prior probability, minus one (lift minus one).
pub fn conf_quot_diff_to_one(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if body_support == 0 || head_support == 0 || n == 0 {
    return 0.0;
  }
  let confidence = both_support as f64 / body_support as f64;
  let prior = head_support as f64 / n as f64;
  confidence / prior - 1.0
}

/// `EM_AIMP`: the rule's leverage — how much the joint support of body and
/// head departs from what independence would predict.
pub fn improvement_diff(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if n == 0 {
    return 0.0;
  }
  let n = n as f64;
  let joint = both_support as f64 / n;
  let independent = (body_support as f64 / n) * (head_support as f64 / n);
  joint - independent
}

/// `EM_INFO`: mutual-information-style gain, `sum(o * ln(o/e))` over the
/// contingency table's four cells, normalised by transaction count.
pub fn info_gain(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if n == 0 {
    return 0.0;
  }
  let table = Contingency::new(body_support, head_support, both_support, n);
  let gain: f64 = table.cells().iter().filter(|(o, e)| *o > 0.0 && *e > 0.0).map(|(o, e)| o * (o / e).ln()).sum();
  gain / table.n
}

/// `EM_CHI2`: Pearson chi-squared statistic, normalised by transaction count
/// (Cramer's phi-squared for a 2x2 table).
pub fn chi2_normalised(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if n == 0 {
    return 0.0;
  }
  let table = Contingency::new(body_support, head_support, both_support, n);
  table.chi_squared() / table.n
}

/// `EM_PVAL`: upper-tail p-value of the chi-squared statistic (one degree of
/// freedom), via [`stats::chi2_pvalue`]. Lower is more significant, so
/// candidates pass when this value is *below* `min_measure`'s complement —
/// callers compare as for every other measure (`score >= min_measure`) after
/// negating, matching `_pval`'s `1 - chi2cdf(...)` return.
pub fn chi2_pvalue(body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  if n == 0 {
    return 1.0;
  }
  let table = Contingency::new(body_support, head_support, both_support, n);
  1.0 - stats::chi2_pvalue(table.chi_squared(), 1.0)
}

/// Dispatches to the evaluation function selected by [`ExtraMeasure`].
pub fn evaluate(measure: ExtraMeasure, body_support: u32, head_support: u32, both_support: u32, n: u32) -> f64 {
  match measure {
    ExtraMeasure::None => none(body_support, head_support, both_support, n),
    ExtraMeasure::ConfDiff => conf_diff(body_support, head_support, both_support, n),
    ExtraMeasure::ConfQuotDiffToOne => conf_quot_diff_to_one(body_support, head_support, both_support, n),
    ExtraMeasure::ImprovementDiff => improvement_diff(body_support, head_support, both_support, n),
    ExtraMeasure::InfoGain => info_gain(body_support, head_support, both_support, n),
    ExtraMeasure::Chi2Normalised => chi2_normalised(body_support, head_support, both_support, n),
    ExtraMeasure::Chi2PValue => chi2_pvalue(body_support, head_support, both_support, n),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn none_always_zero() {
    assert_eq!(none(10, 10, 10, 100), 0.0);
  }

  #[test]
  fn conf_diff_is_positive_for_positively_correlated_rule() {
    // body and head always co-occur, head is otherwise rare: confidence 1.0 >> prior 0.2.
    let d = conf_diff(20, 20, 20, 100);
    assert!((d - 0.8).abs() < 1e-9);
  }

  #[test]
  fn improvement_diff_is_zero_under_independence() {
    // body and head independent: support(both) == support(body)*support(head)/n.
    let n = 100;
    let body = 50;
    let head = 40;
    let both = body * head / n;
    let v = improvement_diff(body, head, both, n);
    assert!(v.abs() < 1e-9, "got {v}");
  }

  #[test]
  fn chi2_normalised_is_zero_under_independence() {
    let n = 100;
    let body = 50;
    let head = 40;
    let both = body * head / n;
    let v = chi2_normalised(body, head, both, n);
    assert!(v.abs() < 1e-6, "got {v}");
  }

  #[test]
  fn chi2_pvalue_increases_with_stronger_association() {
    let weak = chi2_pvalue(50, 40, 21, 100);
    let strong = chi2_pvalue(50, 40, 40, 100);
    assert!(strong > weak);
  }
}
