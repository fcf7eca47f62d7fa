//! # Mining configuration
//!
//! Collects the option table an `apriori` run is parameterized by and
//! validates it eagerly, mirroring the argument checks `ist_create`/`ist_init`
//! perform in `istree.c` (`assert(conf >= 0 && conf <= 1)`, `assert(minlen > 0)`).

use crate::error::MiningError;

/// What kind of pattern the tree should ultimately extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
  Sets,
  ClosedSets,
  MaximalSets,
  Rules,
  Hyperedges,
  Groups,
}

impl Target {
  /// Whether this target needs the rule-mining support thresholds
  /// (`min_supp_for_extension` derived from confidence) rather than a flat
  /// `min_support` floor.
  pub fn mines_rules(self) -> bool {
    matches!(self, Target::Rules | Target::Hyperedges | Target::Groups)
  }
}

/// Additional rule/set evaluation measure, ported from `istree.c`'s `EM_*` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraMeasure {
  None,
  ConfDiff,
  ConfQuotDiffToOne,
  ImprovementDiff,
  InfoGain,
  Chi2Normalised,
  Chi2PValue,
}

/// Whether the extension-support threshold is computed from the support
/// alone, or from `confidence * support` (so that bodies without enough
/// support to be rules themselves are still retained as counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSupportMode {
  BodyOnly,
  BodyAndHead,
}

/// Validated mining parameters. Construct with [`MiningConfig::new`]; there is
/// no public way to obtain an unvalidated instance.
#[derive(Debug, Clone)]
pub struct MiningConfig {
  pub min_support: u32,
  pub min_confidence: f64,
  pub target: Target,
  pub min_len: u32,
  pub max_len: Option<u32>,
  pub extra_measure: ExtraMeasure,
  pub min_measure: f64,
  pub memory_optimise: bool,
  pub rule_support_mode: RuleSupportMode,
}

impl MiningConfig {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    min_support: u32,
    min_confidence: f64,
    target: Target,
    min_len: u32,
    max_len: Option<u32>,
    extra_measure: ExtraMeasure,
    min_measure: f64,
    memory_optimise: bool,
    rule_support_mode: RuleSupportMode,
  ) -> Result<Self, MiningError> {
    if !(0.0..=1.0).contains(&min_confidence) {
      return Err(MiningError::InvalidConfig(format!("min_confidence must be in [0,1], got {min_confidence}")));
    }
    if min_len == 0 {
      return Err(MiningError::InvalidConfig("min_len must be >= 1".into()));
    }
    if let Some(max_len) = max_len {
      if max_len < min_len {
        return Err(MiningError::InvalidConfig(format!("max_len ({max_len}) must be >= min_len ({min_len})")));
      }
    }
    if !(-1.0..=1.0).contains(&min_measure) {
      return Err(MiningError::InvalidConfig(format!("min_measure must be in [-1,1], got {min_measure}")));
    }
    // A support of zero is normalized to 1, matching `ist->supp = (supp > 0) ? supp : 1`.
    let min_support = min_support.max(1);
    Ok(MiningConfig {
      min_support,
      min_confidence,
      target,
      min_len,
      max_len,
      extra_measure,
      min_measure,
      memory_optimise,
      rule_support_mode,
    })
  }

  /// The extension threshold a counter's own support must meet before a
  /// child can be created for it (`min_supp_for_extension` in SPEC_FULL.md §4.4).
  pub(crate) fn min_supp_for_extension(&self) -> u32 {
    if self.target.mines_rules() && matches!(self.rule_support_mode, RuleSupportMode::BodyAndHead) {
      ((self.min_confidence * self.min_support as f64).ceil() as u32).max(1)
    } else {
      self.min_support
    }
  }

  /// The minimum support a subset must have to serve as a rule body
  /// (`min_body_support` in SPEC_FULL.md §4.4) — always the flat `min_support`.
  pub(crate) fn min_body_support(&self) -> u32 {
    self.min_support
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_out_of_range_confidence() {
    let err = MiningConfig::new(2, 1.5, Target::Rules, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
      .unwrap_err();
    assert!(matches!(err, MiningError::InvalidConfig(_)));
  }

  #[test]
  fn rejects_zero_min_len() {
    let err = MiningConfig::new(2, 0.5, Target::Sets, 0, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
      .unwrap_err();
    assert!(matches!(err, MiningError::InvalidConfig(_)));
  }

  #[test]
  fn rejects_max_len_below_min_len() {
    let err =
      MiningConfig::new(2, 0.5, Target::Sets, 3, Some(2), ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly)
        .unwrap_err();
    assert!(matches!(err, MiningError::InvalidConfig(_)));
  }

  #[test]
  fn normalizes_zero_support_to_one() {
    let cfg =
      MiningConfig::new(0, 0.5, Target::Sets, 1, None, ExtraMeasure::None, 0.0, false, RuleSupportMode::BodyOnly).unwrap();
    assert_eq!(cfg.min_support, 1);
  }

  #[test]
  fn rule_support_mode_affects_extension_threshold() {
    let cfg = MiningConfig::new(
      10,
      0.75,
      Target::Rules,
      1,
      None,
      ExtraMeasure::None,
      0.0,
      false,
      RuleSupportMode::BodyAndHead,
    )
    .unwrap();
    assert_eq!(cfg.min_supp_for_extension(), 8); // ceil(0.75 * 10)
    assert_eq!(cfg.min_body_support(), 10);
  }
}
