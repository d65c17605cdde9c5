use crate::refmap::io_common::{path_string, resolve_path};
use crate::refmap::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_REFERENDUM_FILE: &str = "referendum.csv";
pub const DEFAULT_REGIONS_FILE: &str = "regions.csv";
pub const DEFAULT_DEPARTMENTS_FILE: &str = "departments.csv";
pub const DEFAULT_GEOMETRY_FILE: &str = "regions.geojson";
pub const DEFAULT_MAP_FILE: &str = "referendum_map.svg";
pub const DEFAULT_MAP_TITLE: &str = "Referendum: share of Choice A among expressed ballots";

/// Value of the map location that disables the rendering.
pub const NO_MAP: &str = "none";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputFiles {
    #[serde(rename = "referendumFile")]
    pub referendum_file: Option<String>,
    #[serde(rename = "regionsFile")]
    pub regions_file: Option<String>,
    #[serde(rename = "departmentsFile")]
    pub departments_file: Option<String>,
    #[serde(rename = "geometryFile")]
    pub geometry_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "mapFile")]
    pub map_file: Option<String>,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
    #[serde(rename = "mapTitle")]
    pub map_title: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefmapConfig {
    #[serde(default)]
    pub inputs: InputFiles,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    /// The directory of the configuration file. Relative paths are resolved from it.
    #[serde(skip)]
    pub root: PathBuf,
}

pub fn read_config(path: &str) -> RefmapResult<RefmapConfig> {
    info!("Reading configuration {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: RefmapConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    config.root = Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    debug!("config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &Path) -> RefmapResult<JSValue> {
    let p = path_string(path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path: p })
}

/// Picks a location: the command line first, then the configuration, then the default.
fn pick(
    cli: &Option<String>,
    configured: &Option<String>,
    config_root: &Path,
    default_dir: &Path,
    default_name: &str,
) -> PathBuf {
    match (cli, configured) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(config_root, p),
        (None, None) => default_dir.join(default_name),
    }
}

/// Merges the command line and the configuration into the locations of one run.
///
/// Without an explicit data directory, the default files are searched next to the
/// configuration file, or in `data` when there is no configuration.
pub fn resolve_paths(args: &Args, config: Option<&RefmapConfig>) -> PipelinePaths {
    let default_config = RefmapConfig::default();
    let c = config.unwrap_or(&default_config);
    let data_dir: PathBuf = match (&args.data_dir, config) {
        (Some(d), _) => PathBuf::from(d),
        (None, Some(cfg)) => cfg.root.clone(),
        (None, None) => PathBuf::from(DEFAULT_DATA_DIR),
    };
    let root = c.root.as_path();

    let map_setting: Option<String> = args
        .map
        .clone()
        .or_else(|| c.output_settings.map_file.clone());
    let map = match map_setting {
        Some(m) if m == NO_MAP => None,
        Some(m) if args.map.is_some() => Some(PathBuf::from(m)),
        Some(m) => Some(resolve_path(root, &m)),
        None => Some(PathBuf::from(DEFAULT_MAP_FILE)),
    };

    let summary = match (&args.out, &c.output_settings.summary_file) {
        (Some(o), _) if o == "stdout" => Some(SummaryOutput::Stdout),
        (Some(o), _) if o.is_empty() => None,
        (Some(o), _) => Some(SummaryOutput::File(PathBuf::from(o))),
        (None, Some(o)) if o == "stdout" => Some(SummaryOutput::Stdout),
        (None, Some(o)) => Some(SummaryOutput::File(resolve_path(root, o))),
        (None, None) => None,
    };

    PipelinePaths {
        referendum: pick(
            &args.referendum,
            &c.inputs.referendum_file,
            root,
            &data_dir,
            DEFAULT_REFERENDUM_FILE,
        ),
        regions: pick(
            &args.regions,
            &c.inputs.regions_file,
            root,
            &data_dir,
            DEFAULT_REGIONS_FILE,
        ),
        departments: pick(
            &args.departments,
            &c.inputs.departments_file,
            root,
            &data_dir,
            DEFAULT_DEPARTMENTS_FILE,
        ),
        geometry: pick(
            &args.geometry,
            &c.inputs.geometry_file,
            root,
            &data_dir,
            DEFAULT_GEOMETRY_FILE,
        ),
        map,
        map_title: c
            .output_settings
            .map_title
            .clone()
            .unwrap_or_else(|| DEFAULT_MAP_TITLE.to_string()),
        summary,
        reference: args.reference.as_ref().map(PathBuf::from),
    }
}
