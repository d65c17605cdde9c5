// Primitives for reading the CSV tables.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::refmap::{
    io_common::{check_columns, path_string},
    *,
};

pub const REFERENDUM_DELIMITER: u8 = b';';
pub const REFERENCE_DELIMITER: u8 = b',';

pub const REFERENDUM_COLUMNS: [&str; 7] = [
    "Department code",
    "Town code",
    "Registered",
    "Abstentions",
    "Null",
    "Choice A",
    "Choice B",
];
pub const REGIONS_COLUMNS: [&str; 2] = ["code", "name"];
pub const DEPARTMENTS_COLUMNS: [&str; 3] = ["region_code", "code", "name"];

#[derive(Debug, Clone, Deserialize)]
struct ReferendumRow {
    #[serde(rename = "Department code")]
    department_code: Option<String>,
    #[serde(rename = "Department name", default)]
    department_name: Option<String>,
    #[serde(rename = "Town code")]
    town_code: Option<String>,
    #[serde(rename = "Town name", default)]
    town_name: Option<String>,
    #[serde(rename = "Registered")]
    registered: Option<u64>,
    #[serde(rename = "Abstentions")]
    abstentions: Option<u64>,
    #[serde(rename = "Null")]
    null: Option<u64>,
    #[serde(rename = "Choice A")]
    choice_a: Option<u64>,
    #[serde(rename = "Choice B")]
    choice_b: Option<u64>,
}

impl From<ReferendumRow> for BallotRecord {
    fn from(r: ReferendumRow) -> BallotRecord {
        BallotRecord {
            department_code: r.department_code,
            department_name: r.department_name,
            town_code: r.town_code.unwrap_or_default(),
            town_name: r.town_name,
            registered: r.registered.unwrap_or(0),
            abstentions: r.abstentions.unwrap_or(0),
            null: r.null.unwrap_or(0),
            choice_a: r.choice_a.unwrap_or(0),
            choice_b: r.choice_b.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RegionRow {
    code: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DepartmentRow {
    region_code: String,
    code: String,
    name: String,
}

/// Reads a whole table after checking its header.
fn read_table<T: DeserializeOwned>(
    path: &Path,
    delimiter: u8,
    required: &[&str],
) -> RefmapResult<Vec<T>> {
    let p = path_string(path);
    info!("Attempting to read table {:?}", p);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .context(CsvOpenSnafu { path: p.as_str() })?;
    let header = rdr
        .headers()
        .context(CsvOpenSnafu { path: p.as_str() })?
        .clone();
    debug!("read_table: header: {:?}", header);
    check_columns(&p, &header, required)?;

    let mut res: Vec<T> = Vec::new();
    for (idx, row) in rdr.deserialize::<T>().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let row: T = row.context(CsvLineParseSnafu {
            path: p.as_str(),
            lineno,
        })?;
        res.push(row);
    }
    info!("Read {} rows from {:?}", res.len(), p);
    Ok(res)
}

pub fn read_referendum(path: &Path) -> RefmapResult<Vec<BallotRecord>> {
    let rows: Vec<ReferendumRow> = read_table(path, REFERENDUM_DELIMITER, &REFERENDUM_COLUMNS)?;
    Ok(rows.into_iter().map(BallotRecord::from).collect())
}

pub fn read_regions(path: &Path) -> RefmapResult<Vec<RegionRef>> {
    let rows: Vec<RegionRow> = read_table(path, REFERENCE_DELIMITER, &REGIONS_COLUMNS)?;
    Ok(rows
        .into_iter()
        .map(|r| RegionRef {
            code: r.code,
            name: r.name,
        })
        .collect())
}

pub fn read_departments(path: &Path) -> RefmapResult<Vec<DepartmentRef>> {
    let rows: Vec<DepartmentRow> = read_table(path, REFERENCE_DELIMITER, &DEPARTMENTS_COLUMNS)?;
    Ok(rows
        .into_iter()
        .map(|r| DepartmentRef {
            region_code: r.region_code,
            code: r.code,
            name: r.name,
        })
        .collect())
}
