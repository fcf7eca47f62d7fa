//! `apriori` CLI: reads a tabular transaction file, mines it to a fixed
//! point, and prints the selected pattern kind to stdout, one per line.

use apriori_tree::{mine_to_fixed_point, reader, ExtraMeasure, FilterMode, MiningConfig, RuleSupportMode, SymbolTable, Target, Tree};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
  Sets,
  ClosedSets,
  MaximalSets,
  Rules,
  Hyperedges,
  Groups,
}

impl From<TargetArg> for Target {
  fn from(value: TargetArg) -> Self {
    match value {
      TargetArg::Sets => Target::Sets,
      TargetArg::ClosedSets => Target::ClosedSets,
      TargetArg::MaximalSets => Target::MaximalSets,
      TargetArg::Rules => Target::Rules,
      TargetArg::Hyperedges => Target::Hyperedges,
      TargetArg::Groups => Target::Groups,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MeasureArg {
  None,
  ConfDiff,
  ConfQuotDiffToOne,
  ImprovementDiff,
  InfoGain,
  Chi2Normalised,
  Chi2PValue,
}

impl From<MeasureArg> for ExtraMeasure {
  fn from(value: MeasureArg) -> Self {
    match value {
      MeasureArg::None => ExtraMeasure::None,
      MeasureArg::ConfDiff => ExtraMeasure::ConfDiff,
      MeasureArg::ConfQuotDiffToOne => ExtraMeasure::ConfQuotDiffToOne,
      MeasureArg::ImprovementDiff => ExtraMeasure::ImprovementDiff,
      MeasureArg::InfoGain => ExtraMeasure::InfoGain,
      MeasureArg::Chi2Normalised => ExtraMeasure::Chi2Normalised,
      MeasureArg::Chi2PValue => ExtraMeasure::Chi2PValue,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RuleSupportModeArg {
  BodyOnly,
  BodyAndHead,
}

impl From<RuleSupportModeArg> for RuleSupportMode {
  fn from(value: RuleSupportModeArg) -> Self {
    match value {
      RuleSupportModeArg::BodyOnly => RuleSupportMode::BodyOnly,
      RuleSupportModeArg::BodyAndHead => RuleSupportMode::BodyAndHead,
    }
  }
}

/// Mine frequent item sets, rules, hyperedges, or groups from a tabular transaction file.
#[derive(Debug, Parser)]
#[command(name = "apriori", version, about)]
struct Args {
  /// Path to a whitespace/comma-separated transaction file, one transaction per line.
  input: PathBuf,

  #[arg(long, default_value_t = 1)]
  min_support: u32,

  #[arg(long, default_value_t = 0.8)]
  min_confidence: f64,

  #[arg(long, value_enum, default_value = "sets")]
  target: TargetArg,

  #[arg(long, default_value_t = 1)]
  min_len: u32,

  #[arg(long)]
  max_len: Option<u32>,

  #[arg(long, value_enum, default_value = "none")]
  extra_measure: MeasureArg,

  #[arg(long, default_value_t = 0.0)]
  min_measure: f64,

  #[arg(long, default_value_t = false)]
  memory_optimise: bool,

  #[arg(long, value_enum, default_value = "body-only")]
  rule_support_mode: RuleSupportModeArg,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let args = Args::parse();

  let config = MiningConfig::new(
    args.min_support,
    args.min_confidence,
    args.target.into(),
    args.min_len,
    args.max_len,
    args.extra_measure.into(),
    args.min_measure,
    args.memory_optimise,
    args.rule_support_mode.into(),
  )?;

  let mut dict = SymbolTable::new();
  let file = File::open(&args.input)?;
  let transactions = reader::read_transactions(BufReader::new(file), &mut dict)?;
  dict.reorder_by_frequency();

  let mut tree = Tree::new(&dict, transactions.len() as u32, config)?;
  mine_to_fixed_point(&mut tree, &transactions)?;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  emit(&mut tree, &dict, &mut out)?;
  Ok(())
}

fn emit(tree: &mut Tree, dict: &SymbolTable, out: &mut impl Write) -> io::Result<()> {
  let format_items = |items: &[apriori_tree::ItemId]| items.iter().map(|&i| dict.name(i)).collect::<Vec<_>>().join(" ");

  match tree.config().target {
    Target::Sets => {
      for set in tree.sets() {
        writeln!(out, "{} ({}) [{:.4}]", format_items(&set.items), set.support, set.measure)?;
      }
    }
    Target::ClosedSets => {
      tree.filter(FilterMode::Closed);
      for set in tree.sets() {
        writeln!(out, "{} ({}) [{:.4}]", format_items(&set.items), set.support, set.measure)?;
      }
    }
    Target::MaximalSets => {
      tree.filter(FilterMode::Maximal);
      for set in tree.sets() {
        writeln!(out, "{} ({}) [{:.4}]", format_items(&set.items), set.support, set.measure)?;
      }
    }
    Target::Rules => {
      for rule in tree.rules() {
        writeln!(
          out,
          "{} -> {} ({}, conf={:.4}, lift={:.4}, measure={:.4})",
          format_items(&rule.body),
          dict.name(rule.head),
          rule.support,
          rule.confidence,
          rule.lift,
          rule.measure
        )?;
      }
    }
    Target::Hyperedges => {
      for edge in tree.hyperedges() {
        writeln!(
          out,
          "{} ({}, avg_conf={:.4}, measure={:.4})",
          format_items(&edge.items),
          edge.support,
          edge.avg_confidence,
          edge.measure
        )?;
      }
    }
    Target::Groups => {
      for group in tree.groups() {
        writeln!(out, "{} ({}) [{:.4}]", format_items(&group.items), group.support, group.measure)?;
      }
    }
  }
  Ok(())
}
