// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One row of the referendum file: the counts for one polling subdivision.
///
/// The counts are expected to satisfy
/// `registered = abstentions + null + choice_a + choice_b`, but nothing in the
/// pipeline relies on it.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotRecord {
    /// The department code as written in the referendum file (unpadded, may
    /// contain a territory marker). Missing codes are kept as `None`.
    pub department_code: Option<String>,
    pub department_name: Option<String>,
    pub town_code: String,
    pub town_name: Option<String>,
    pub registered: u64,
    pub abstentions: u64,
    pub null: u64,
    pub choice_a: u64,
    pub choice_b: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RegionRef {
    pub code: String,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DepartmentRef {
    /// Foreign key into the region table.
    pub region_code: String,
    pub code: String,
    pub name: String,
}

/// A ring of (longitude, latitude) points.
pub type Ring = Vec<(f64, f64)>;

/// The outline of a region.
#[derive(PartialEq, Debug, Clone)]
pub enum Geometry {
    /// Exterior ring first, then the holes.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// All the rings of the geometry, exteriors and holes alike.
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Polygon(rings) => rings.iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RegionGeometry {
    pub code: String,
    pub geometry: Geometry,
}

// ******** Derived data structures *********

/// A department with the region it belongs to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AreaLookup {
    pub code_reg: String,
    pub name_reg: String,
    pub code_dep: String,
    pub name_dep: String,
}

/// A ballot record with the area it was matched to, if any.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct JoinedBallot {
    pub ballot: BallotRecord,
    pub area: Option<AreaLookup>,
}

/// The five vote counts that are summed together.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Tally {
    pub registered: u64,
    pub abstentions: u64,
    pub null: u64,
    pub choice_a: u64,
    pub choice_b: u64,
}

impl Tally {
    pub const COLUMNS: [&'static str; 5] =
        ["Registered", "Abstentions", "Null", "Choice A", "Choice B"];

    pub fn of_ballot(b: &BallotRecord) -> Tally {
        Tally {
            registered: b.registered,
            abstentions: b.abstentions,
            null: b.null,
            choice_a: b.choice_a,
            choice_b: b.choice_b,
        }
    }

    pub fn values(&self) -> [u64; 5] {
        [
            self.registered,
            self.abstentions,
            self.null,
            self.choice_a,
            self.choice_b,
        ]
    }
}

/// The aggregated counts of one region.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RegionResult {
    pub code_reg: String,
    pub name_reg: String,
    pub tally: Tally,
}

/// The ballots that could not be matched to any area.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct UnmatchedTally {
    pub num_rows: usize,
    pub tally: Tally,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationResult {
    /// One entry per region, ordered by region code.
    pub regions: Vec<RegionResult>,
    pub unmatched: UnmatchedTally,
}

/// The share of "Choice A" among the expressed ballots.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Ratio {
    /// Always between 0 and 1.
    Value(f64),
    /// No ballot was expressed for either choice.
    Undefined,
}

impl Ratio {
    pub fn as_option(&self) -> Option<f64> {
        match self {
            Ratio::Value(x) => Some(*x),
            Ratio::Undefined => None,
        }
    }
}

/// A region that can be drawn on the map.
#[derive(PartialEq, Debug, Clone)]
pub struct MapRegion {
    pub result: RegionResult,
    pub geometry: Geometry,
    pub ratio: Ratio,
}

/// Errors that prevent the aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReferendumErrors {
    /// The sum of a count column does not fit in 64 bits.
    CountOverflow {
        column: &'static str,
        code_reg: Option<String>,
    },
}

impl Error for ReferendumErrors {}

impl Display for ReferendumErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferendumErrors::CountOverflow {
                column,
                code_reg: Some(code),
            } => write!(f, "Overflow when summing column {} of region {}", column, code),
            ReferendumErrors::CountOverflow {
                column,
                code_reg: None,
            } => write!(f, "Overflow when summing column {} of unmatched ballots", column),
        }
    }
}
