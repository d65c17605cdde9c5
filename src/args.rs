use clap::Parser;

/// This program aggregates the results of a referendum by region and draws them on a map.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the input files and the outputs.
    /// Relative paths in this file are resolved from the directory of the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default 'data') The directory containing referendum.csv, regions.csv,
    /// departments.csv and regions.geojson.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (file path) The referendum results, separated by semicolons.
    #[clap(long, value_parser)]
    pub referendum: Option<String>,

    /// (file path) The regions, with the columns code and name.
    #[clap(long, value_parser)]
    pub regions: Option<String>,

    /// (file path) The departments, with the columns region_code, code and name.
    #[clap(long, value_parser)]
    pub departments: Option<String>,

    /// (file path) The GeoJSON outline of the regions.
    #[clap(long, value_parser)]
    pub geometry: Option<String>,

    /// (file path or 'none', default referendum_map.svg) Where to write the map in SVG format.
    #[clap(short, long, value_parser)]
    pub map: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the results will be written in JSON format to the
    /// given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, refmap will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
