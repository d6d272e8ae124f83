//! Analyze command implementation

use anyhow::{Context, Result};
use solarscout_analysis::{analyze_with, AnalysisOptions, ResultEncoder};
use solarscout_core::config::LayeredConfig;
use solarscout_core::models::AnalysisConfig;

use crate::cli::AnalyzeArgs;
use crate::output::OutputWriter;
use crate::output_types::{AnalyzeOutput, SiteRow};

pub async fn execute(args: AnalyzeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let analysis = AnalysisConfig::new(
        args.buffer_distance,
        args.exclude_nature,
        args.min_area,
        args.max_grid_distance,
    )
    .context("Invalid analysis parameters")?;
    let options = AnalysisOptions::from_config(config)?;

    let snapshot = super::build_snapshot(&args.source, config).await?;
    if !snapshot.report.dropped.is_empty() {
        output.warning(format!(
            "{} raw features dropped during the build (run `solarscout inspect` for details)",
            snapshot.report.dropped.len()
        ));
    }

    let candidate_count = snapshot.parcels.len();
    let (canonical_srid, output_srid) = (snapshot.canonical_srid, config.output_srid.value);
    let write_collection = args.output.is_some();
    let (sites, collection) = tokio::task::spawn_blocking(move || -> solarscout_core::Result<_> {
        let sites = analyze_with(&snapshot, &analysis, &options)?;
        let collection = if write_collection {
            Some(ResultEncoder::new(canonical_srid, output_srid)?.encode(&sites)?)
        } else {
            None
        };
        Ok((sites, collection))
    })
    .await
    .context("Analysis task failed")??;

    if let (Some(path), Some(collection)) = (&args.output, collection) {
        let json = serde_json::to_string_pretty(&geojson::GeoJson::from(collection))?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let rows = SiteRow::ranked(&sites);
    if output.is_json() {
        return output.result(&AnalyzeOutput {
            source: args.source.display().to_string(),
            buffer_distance_m: analysis.buffer_distance_m(),
            exclude_nature: analysis.exclude_nature(),
            min_area_ha: analysis.min_area_ha(),
            max_grid_distance_m: analysis.max_grid_distance_m(),
            candidate_parcels: candidate_count,
            sites: rows,
            output_file: args.output.as_ref().map(|path| path.display().to_string()),
        });
    }

    output.section("Suitable Sites");
    output.table(rows);
    output.info(format!(
        "{} of {} candidate parcels suitable (buffer {} m, nature reserves {}, min area {} ha, max grid distance {} m)",
        sites.len(),
        candidate_count,
        analysis.buffer_distance_m(),
        if analysis.exclude_nature() { "excluded" } else { "allowed" },
        analysis.min_area_ha(),
        analysis.max_grid_distance_m(),
    ));
    if let Some(path) = &args.output {
        output.success(format!("Wrote {}", path.display()));
    }

    Ok(())
}
