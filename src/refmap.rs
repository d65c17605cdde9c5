use log::{debug, info, warn};

use referendum::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::refmap::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_geojson;
mod render_svg;

#[derive(Debug, Snafu)]
pub enum RefmapError {
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Missing columns {missing:?} in {path}"))]
    MissingColumns { path: String, missing: Vec<String> },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Feature {index} of {path} has no region code"))]
    MissingRegionCode { path: String, index: usize },
    #[snafu(display("Feature {index} of {path} has an unsupported geometry: {kind}"))]
    UnsupportedGeometry {
        path: String,
        index: usize,
        kind: String,
    },
    #[snafu(display("Feature {index} of {path} has invalid coordinates"))]
    InvalidCoordinates { path: String, index: usize },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error while aggregating the results"))]
    Aggregation { source: ReferendumErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type RefmapResult<T> = Result<T, RefmapError>;

/// Where the JSON summary goes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SummaryOutput {
    Stdout,
    File(PathBuf),
}

/// All the locations used by one run, once the command line and the configuration are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelinePaths {
    pub referendum: PathBuf,
    pub regions: PathBuf,
    pub departments: PathBuf,
    pub geometry: PathBuf,
    pub map: Option<PathBuf>,
    pub map_title: String,
    pub summary: Option<SummaryOutput>,
    pub reference: Option<PathBuf>,
}

fn count_js(x: u64) -> JSValue {
    // Strings, since the counts are not guaranteed to fit in a JSON number.
    json!(x.to_string())
}

fn tally_js(t: &Tally) -> JSValue {
    json!({
        "registered": count_js(t.registered),
        "abstentions": count_js(t.abstentions),
        "null": count_js(t.null),
        "choiceA": count_js(t.choice_a),
        "choiceB": count_js(t.choice_b),
    })
}

fn build_summary_js(aggregation: &AggregationResult, map: &[MapRegion]) -> JSValue {
    let regions: Vec<JSValue> = aggregation
        .regions
        .iter()
        .map(|r| {
            let on_map = map.iter().any(|m| m.result.code_reg == r.code_reg);
            json!({
                "code": r.code_reg,
                "name": r.name_reg,
                "tally": tally_js(&r.tally),
                "ratio": compute_ratio(&r.tally).as_option(),
                "onMap": on_map,
            })
        })
        .collect();
    json!({
        "regions": regions,
        "unmatched": {
            "rows": aggregation.unmatched.num_rows,
            "tally": tally_js(&aggregation.unmatched.tally),
        },
    })
}

fn format_ratio(r: Ratio) -> String {
    match r {
        Ratio::Value(x) => format!("{:.4}", x),
        Ratio::Undefined => "undefined".to_string(),
    }
}

/// A plain text table of the results, one line per region.
pub fn format_results_table(aggregation: &AggregationResult) -> String {
    let name_width = aggregation
        .regions
        .iter()
        .map(|r| r.name_reg.chars().count())
        .chain(std::iter::once("name_reg".len()))
        .max()
        .unwrap_or(0);
    let code_width = aggregation
        .regions
        .iter()
        .map(|r| r.code_reg.chars().count())
        .chain(std::iter::once("code_reg".len()))
        .max()
        .unwrap_or(0);

    let mut lines: Vec<String> = Vec::new();
    let mut header = format!("{:<cw$}  {:<nw$}", "code_reg", "name_reg", cw = code_width, nw = name_width);
    for c in Tally::COLUMNS {
        header.push_str(&format!("  {:>12}", c));
    }
    header.push_str(&format!("  {:>9}", "ratio"));
    lines.push(header);

    for r in aggregation.regions.iter() {
        let mut line = format!(
            "{:<cw$}  {:<nw$}",
            r.code_reg,
            r.name_reg,
            cw = code_width,
            nw = name_width
        );
        for x in r.tally.values() {
            line.push_str(&format!("  {:>12}", x));
        }
        line.push_str(&format!("  {:>9}", format_ratio(compute_ratio(&r.tally))));
        lines.push(line);
    }
    if aggregation.unmatched.num_rows > 0 {
        lines.push(format!(
            "({} rows without region, {} registered)",
            aggregation.unmatched.num_rows, aggregation.unmatched.tally.registered
        ));
    }
    lines.join("\n")
}

fn check_reference(reference_p: &Path, pretty_js_stats: &str) -> RefmapResult<()> {
    let summary_ref = read_summary(reference_p)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("Summary matches the reference {}", reference_p.display());
    Ok(())
}

/// Runs the whole pipeline, from the input files to the map.
///
/// Returns the regions drawn on the map, with their ratio.
pub fn run_referendum(paths: &PipelinePaths) -> RefmapResult<Vec<MapRegion>> {
    info!("Running with {:?}", paths);
    let referendum = io_csv::read_referendum(&paths.referendum)?;
    let regions = io_csv::read_regions(&paths.regions)?;
    let departments = io_csv::read_departments(&paths.departments)?;

    let areas = merge_regions_and_departments(&regions, &departments);
    let joined = merge_referendum_and_areas(&referendum, &areas);
    let aggregation = compute_referendum_result_by_regions(&joined).context(AggregationSnafu {})?;

    println!("{}", format_results_table(&aggregation));

    let geometries = io_geojson::read_region_geometries(&paths.geometry)?;
    let map = build_region_map(&aggregation.regions, &geometries);

    if let Some(map_p) = &paths.map {
        render_svg::write_choropleth(map_p, &map, &paths.map_title)?;
    }

    let summary_js = build_summary_js(&aggregation, &map);
    let pretty_js_stats =
        serde_json::to_string_pretty(&summary_js).context(SerializingSummarySnafu {})?;
    match &paths.summary {
        Some(SummaryOutput::Stdout) => {
            println!("{}", pretty_js_stats);
        }
        Some(SummaryOutput::File(p)) => {
            info!("Writing summary to {}", p.display());
            fs::write(p, &pretty_js_stats).context(WritingOutputSnafu {
                path: p.display().to_string(),
            })?;
        }
        None => {}
    }

    if let Some(reference_p) = &paths.reference {
        check_reference(reference_p, &pretty_js_stats)?;
    }

    Ok(map)
}

/// Entry point of the command line: resolves the locations and runs the pipeline.
pub fn run(args: &Args) -> RefmapResult<Vec<MapRegion>> {
    let config = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let paths = resolve_paths(args, config.as_ref());
    run_referendum(&paths)
}
