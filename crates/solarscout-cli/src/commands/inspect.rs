//! Inspect command implementation

use anyhow::Result;
use solarscout_core::config::LayeredConfig;

use crate::cli::InspectArgs;
use crate::output::OutputWriter;
use crate::output_types::{CategoryRow, DroppedRow, InspectOutput};

pub async fn execute(args: InspectArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let snapshot = super::build_snapshot(&args.source, config).await?;
    let report = &snapshot.report;

    if output.is_json() {
        return output.result(&InspectOutput {
            source: args.source.display().to_string(),
            canonical_srid: snapshot.canonical_srid,
            report: report.clone(),
        });
    }

    output.section("Snapshot");
    output.kv("Source", args.source.display());
    output.kv("Canonical CRS", format!("EPSG:{}", snapshot.canonical_srid));
    output.kv("Raw features", report.raw_features);
    output.kv("Candidate parcels", report.candidate_parcels);
    output.kv("Grid segments", report.grid_segments);
    output.kv("Unclassified", report.unclassified);

    output.section("Exclusion Features");
    output.table(CategoryRow::from_counts(&report.exclusion_features));

    output.section("Configuration");
    let mut entries: Vec<_> = config.to_inspection_map().into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, (value, source)) in entries {
        output.kv(key, format!("{value} ({source:?})"));
    }

    if report.dropped.is_empty() {
        output.success("No features dropped");
    } else {
        output.section("Dropped Features");
        output.table(report.dropped.iter().map(DroppedRow::from).collect());
        output.warning(format!("{} features dropped", report.dropped.len()));
    }

    Ok(())
}
