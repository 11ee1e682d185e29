use std::path::PathBuf;

use evochess_evaluator::feature::{Feature, FeatureSignal};
use serde::Serialize;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct FeaturesArg {
    /// Print the list as JSON
    #[arg(long)]
    json: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FeatureEntry {
    index: usize,
    id: &'static str,
    signal: FeatureSignal,
    flag: bool,
}

fn entries() -> Vec<FeatureEntry> {
    Feature::ALL
        .iter()
        .map(|&feature| FeatureEntry {
            index: feature.index(),
            id: feature.id(),
            signal: feature.signal(),
            flag: feature.is_flag(),
        })
        .collect()
}

fn render_table(entries: &[FeatureEntry]) -> String {
    let width = entries.iter().map(|e| e.id.len()).max().unwrap_or_default();
    entries
        .iter()
        .map(|entry| {
            let sign = match entry.signal {
                FeatureSignal::Positive => '+',
                FeatureSignal::Negative => '-',
            };
            let kind = if entry.flag { "flag" } else { "count" };
            format!("{:2}  {:width$}  {sign}  {kind}\n", entry.index, entry.id)
        })
        .collect()
}

pub(crate) fn run(arg: &FeaturesArg) -> anyhow::Result<()> {
    let entries = entries();
    if arg.json {
        util::write_json(arg.output.as_deref(), &entries)
    } else {
        util::write_text(arg.output.as_deref(), &render_table(&entries))
    }
}
