mod config;
pub mod manual;
pub mod territory;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;
use crate::territory::{is_excluded_ballot_code, normalize_department_code};

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
struct VoteCount(u64);

impl VoteCount {
    fn checked_add(self, rhs: u64) -> Option<VoteCount> {
        self.0.checked_add(rhs).map(VoteCount)
    }
}

/// Running sums of the five count columns.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct TallyAcc([VoteCount; 5]);

impl TallyAcc {
    fn add(&mut self, t: &Tally, code_reg: Option<&str>) -> Result<(), ReferendumErrors> {
        for (idx, x) in t.values().iter().enumerate() {
            self.0[idx] = self.0[idx]
                .checked_add(*x)
                .ok_or_else(|| ReferendumErrors::CountOverflow {
                    column: Tally::COLUMNS[idx],
                    code_reg: code_reg.map(|s| s.to_string()),
                })?;
        }
        Ok(())
    }

    fn tally(&self) -> Tally {
        let [registered, abstentions, null, choice_a, choice_b] = self.0;
        Tally {
            registered: registered.0,
            abstentions: abstentions.0,
            null: null.0,
            choice_a: choice_a.0,
            choice_b: choice_b.0,
        }
    }
}

/// Merges the region and department reference tables.
///
/// Every department is paired with the region whose code is the region code
/// of the department. Departments pointing to an unknown region are skipped.
/// The output follows the order of the department table.
pub fn merge_regions_and_departments(
    regions: &[RegionRef],
    departments: &[DepartmentRef],
) -> Vec<AreaLookup> {
    let regions_by_code: HashMap<&str, &RegionRef> =
        regions.iter().map(|r| (r.code.as_str(), r)).collect();
    let mut res: Vec<AreaLookup> = Vec::new();
    for dep in departments.iter() {
        match regions_by_code.get(dep.region_code.as_str()) {
            Some(reg) => res.push(AreaLookup {
                code_reg: reg.code.clone(),
                name_reg: reg.name.clone(),
                code_dep: dep.code.clone(),
                name_dep: dep.name.clone(),
            }),
            None => {
                debug!(
                    "merge_regions_and_departments: department {} ({}) has unknown region {:?}",
                    dep.code, dep.name, dep.region_code
                );
            }
        }
    }
    info!(
        "Merged {} regions and {} departments into {} areas",
        regions.len(),
        departments.len(),
        res.len()
    );
    res
}

/// Builds the lookup table of the areas by normalized department code.
///
/// Territory departments are removed. If two areas share the same normalized
/// code, the first one is kept.
fn normalized_areas(areas: &[AreaLookup]) -> HashMap<String, AreaLookup> {
    let mut res: HashMap<String, AreaLookup> = HashMap::new();
    for area in areas.iter() {
        let code = match normalize_department_code(&area.code_dep) {
            Some(c) => c,
            None => {
                debug!(
                    "normalized_areas: dropping territory department {:?}",
                    area.code_dep
                );
                continue;
            }
        };
        if let Some(prev) = res.get(&code) {
            warn!(
                "normalized_areas: department code {:?} of {} already used by {}, skipping",
                code, area.name_dep, prev.name_dep
            );
            continue;
        }
        res.insert(
            code.clone(),
            AreaLookup {
                code_dep: code,
                ..area.clone()
            },
        );
    }
    res
}

/// Joins the ballot records with the areas they belong to.
///
/// Ballots from overseas territories and from abroad are removed. The others
/// are matched on the department code after normalization of the area codes.
/// Ballots without a matching area are kept with no area (left join).
pub fn merge_referendum_and_areas(
    ballots: &[BallotRecord],
    areas: &[AreaLookup],
) -> Vec<JoinedBallot> {
    let areas_by_code = normalized_areas(areas);
    let mut num_excluded: usize = 0;
    let mut num_unmatched: usize = 0;
    let mut res: Vec<JoinedBallot> = Vec::with_capacity(ballots.len());
    for b in ballots.iter() {
        if is_excluded_ballot_code(b.department_code.as_deref()) {
            num_excluded += 1;
            continue;
        }
        let area = b
            .department_code
            .as_ref()
            .and_then(|code| areas_by_code.get(code))
            .cloned();
        if area.is_none() {
            num_unmatched += 1;
            debug!(
                "merge_referendum_and_areas: no area for town {} (department {:?})",
                b.town_code, b.department_code
            );
        }
        res.push(JoinedBallot {
            ballot: b.clone(),
            area,
        });
    }
    info!(
        "Joined {} ballot records: {} excluded as territories, {} without area",
        ballots.len(),
        num_excluded,
        num_unmatched
    );
    res
}

/// Sums the ballot counts of each region.
///
/// The name of a region is taken from its first ballot. Ballots with no
/// area cannot be placed in a region: they are left out of the regions and
/// summed separately in `unmatched`.
pub fn compute_referendum_result_by_regions(
    joined: &[JoinedBallot],
) -> Result<AggregationResult, ReferendumErrors> {
    let mut groups: BTreeMap<&str, (&str, TallyAcc)> = BTreeMap::new();
    let mut unmatched_acc = TallyAcc::default();
    let mut unmatched_rows: usize = 0;
    for jb in joined.iter() {
        let t = Tally::of_ballot(&jb.ballot);
        match &jb.area {
            Some(area) => {
                let (_, acc) = groups
                    .entry(area.code_reg.as_str())
                    .or_insert_with(|| (area.name_reg.as_str(), TallyAcc::default()));
                acc.add(&t, Some(area.code_reg.as_str()))?;
            }
            None => {
                unmatched_rows += 1;
                unmatched_acc.add(&t, None)?;
            }
        }
    }

    let unmatched = UnmatchedTally {
        num_rows: unmatched_rows,
        tally: unmatched_acc.tally(),
    };
    if unmatched.num_rows > 0 {
        warn!(
            "{} ballot records without region were left out ({} registered)",
            unmatched.num_rows, unmatched.tally.registered
        );
    }

    let regions: Vec<RegionResult> = groups
        .into_iter()
        .map(|(code, (name, acc))| RegionResult {
            code_reg: code.to_string(),
            name_reg: name.to_string(),
            tally: acc.tally(),
        })
        .collect();
    info!("Aggregated results for {} regions", regions.len());
    Ok(AggregationResult { regions, unmatched })
}

/// The share of "Choice A" over the ballots expressed for either choice.
pub fn compute_ratio(tally: &Tally) -> Ratio {
    let a = tally.choice_a as f64;
    let b = tally.choice_b as f64;
    if tally.choice_a == 0 && tally.choice_b == 0 {
        Ratio::Undefined
    } else {
        Ratio::Value(a / (a + b))
    }
}

/// Attaches the geometry and the ratio to the results of each region.
///
/// Only the regions present in both inputs are returned, in the order of the
/// results.
pub fn build_region_map(
    results: &[RegionResult],
    geometries: &[RegionGeometry],
) -> Vec<MapRegion> {
    let geometries_by_code: HashMap<&str, &RegionGeometry> =
        geometries.iter().map(|g| (g.code.as_str(), g)).collect();
    let mut res: Vec<MapRegion> = Vec::new();
    for r in results.iter() {
        match geometries_by_code.get(r.code_reg.as_str()) {
            Some(g) => {
                let ratio = compute_ratio(&r.tally);
                if ratio == Ratio::Undefined {
                    warn!(
                        "Region {} ({}) has no expressed ballot, its ratio is undefined",
                        r.code_reg, r.name_reg
                    );
                }
                res.push(MapRegion {
                    result: r.clone(),
                    geometry: g.geometry.clone(),
                    ratio,
                });
            }
            None => {
                debug!(
                    "build_region_map: no geometry for region {} ({})",
                    r.code_reg, r.name_reg
                );
            }
        }
    }
    info!(
        "Map built with {} regions ({} results, {} geometries)",
        res.len(),
        results.len(),
        geometries.len()
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn region(code: &str, name: &str) -> RegionRef {
        RegionRef {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn department(region_code: &str, code: &str, name: &str) -> DepartmentRef {
        DepartmentRef {
            region_code: region_code.to_string(),
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn area(code_reg: &str, name_reg: &str, code_dep: &str, name_dep: &str) -> AreaLookup {
        AreaLookup {
            code_reg: code_reg.to_string(),
            name_reg: name_reg.to_string(),
            code_dep: code_dep.to_string(),
            name_dep: name_dep.to_string(),
        }
    }

    fn ballot(dep: Option<&str>, town: &str, counts: [u64; 5]) -> BallotRecord {
        let [registered, abstentions, null, choice_a, choice_b] = counts;
        BallotRecord {
            department_code: dep.map(|s| s.to_string()),
            department_name: None,
            town_code: town.to_string(),
            town_name: None,
            registered,
            abstentions,
            null,
            choice_a,
            choice_b,
        }
    }

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]])
    }

    fn total(joined: &[JoinedBallot]) -> [u64; 5] {
        let mut res = [0u64; 5];
        for jb in joined {
            for (idx, x) in Tally::of_ballot(&jb.ballot).values().iter().enumerate() {
                res[idx] += x;
            }
        }
        res
    }

    #[test]
    fn merge_single_department() {
        init();
        let regions = vec![region("1", "Region A")];
        let departments = vec![department("1", "07", "Dept X")];
        let res = merge_regions_and_departments(&regions, &departments);
        assert_eq!(res, vec![area("1", "Region A", "07", "Dept X")]);
    }

    #[test]
    fn merge_uses_the_region_of_each_department() {
        init();
        let regions = vec![region("84", "Auvergne"), region("11", "Ile-de-France")];
        let departments = vec![
            department("84", "01", "Ain"),
            department("11", "75", "Paris"),
            department("84", "07", "Ardeche"),
            department("99", "42", "Nowhere"),
        ];
        let res = merge_regions_and_departments(&regions, &departments);
        assert_eq!(res.len(), 3);
        for a in res.iter() {
            let r = regions.iter().find(|r| r.code == a.code_reg).unwrap();
            assert_eq!(r.name, a.name_reg);
        }
        let codes: Vec<&str> = res.iter().map(|a| a.code_dep.as_str()).collect();
        assert_eq!(codes, vec!["01", "75", "07"]);
    }

    #[test]
    fn padded_code_matches_unpadded_ballot() {
        init();
        let areas = vec![area("1", "Region A", "07", "Dept X")];
        let ballots = vec![ballot(Some("7"), "1", [10, 1, 1, 5, 3])];
        let res = merge_referendum_and_areas(&ballots, &areas);
        assert_eq!(res.len(), 1);
        let a = res[0].area.as_ref().unwrap();
        assert_eq!(a.code_dep, "7");
        assert_eq!(a.code_reg, "1");
        assert_eq!(a.name_dep, "Dept X");
    }

    #[test]
    fn territories_are_removed() {
        init();
        let areas = vec![
            area("1", "Region A", "01", "Ain"),
            area("94", "Corse", "2A", "Corse-du-Sud"),
            area("01", "Guadeloupe", "971", "Guadeloupe"),
        ];
        let ballots = vec![
            ballot(Some("1"), "1", [10, 1, 1, 5, 3]),
            ballot(Some("ZA"), "1", [10, 1, 1, 5, 3]),
            ballot(Some("ZZ"), "2", [10, 1, 1, 5, 3]),
            ballot(Some("2A"), "4", [10, 1, 1, 5, 3]),
            ballot(Some("971"), "5", [10, 1, 1, 5, 3]),
        ];
        let res = merge_referendum_and_areas(&ballots, &areas);
        assert_eq!(res.len(), 3);
        assert!(res.iter().all(|jb| !jb
            .ballot
            .department_code
            .as_deref()
            .unwrap_or("")
            .contains('Z')));
        // Corsica keeps its alphanumeric code.
        assert_eq!(res[1].area.as_ref().unwrap().name_reg, "Corse");
        // The three-digit department of the reference table is never joined.
        assert_eq!(res[2].area, None);
    }

    #[test]
    fn unmatched_and_missing_codes_are_kept() {
        init();
        let areas = vec![area("1", "Region A", "01", "Ain")];
        let ballots = vec![
            ballot(None, "1", [10, 1, 1, 5, 3]),
            ballot(Some("42"), "2", [10, 1, 1, 5, 3]),
            ballot(Some(" 1"), "3", [10, 1, 1, 5, 3]),
        ];
        let res = merge_referendum_and_areas(&ballots, &areas);
        assert_eq!(res.len(), 3);
        assert!(res.iter().all(|jb| jb.area.is_none()));
    }

    #[test]
    fn region_sums() {
        init();
        let joined: Vec<JoinedBallot> = vec![
            JoinedBallot {
                ballot: ballot(Some("7"), "1", [100, 20, 10, 40, 30]),
                area: Some(area("1", "Region A", "7", "Dept X")),
            },
            JoinedBallot {
                ballot: ballot(Some("7"), "2", [50, 30, 5, 10, 5]),
                area: Some(area("1", "Region A", "7", "Dept X")),
            },
        ];
        let res = compute_referendum_result_by_regions(&joined).unwrap();
        assert_eq!(res.regions.len(), 1);
        let r = &res.regions[0];
        assert_eq!(r.code_reg, "1");
        assert_eq!(r.name_reg, "Region A");
        assert_eq!(r.tally.registered, 150);
        assert_eq!(r.tally.choice_a, 50);
        assert_eq!(r.tally.choice_b, 35);
        match compute_ratio(&r.tally) {
            Ratio::Value(x) => assert!((x - 50.0 / 85.0).abs() < 1e-12),
            Ratio::Undefined => panic!("ratio should be defined"),
        }
    }

    #[test]
    fn sums_are_conserved() {
        init();
        let regions = vec![region("1", "Region A"), region("2", "Region B")];
        let departments = vec![
            department("1", "01", "Ain"),
            department("1", "02", "Aisne"),
            department("2", "2A", "Corse-du-Sud"),
            department("2", "974", "La Reunion"),
        ];
        let ballots = vec![
            ballot(Some("1"), "1", [100, 20, 10, 40, 30]),
            ballot(Some("2"), "1", [80, 10, 2, 40, 28]),
            ballot(Some("2A"), "1", [60, 30, 0, 10, 20]),
            ballot(Some("ZD"), "1", [1000, 0, 0, 1000, 0]),
            ballot(Some("99"), "1", [7, 1, 1, 3, 2]),
            ballot(None, "2", [3, 0, 0, 3, 0]),
        ];
        let areas = merge_regions_and_departments(&regions, &departments);
        let joined = merge_referendum_and_areas(&ballots, &areas);
        let res = compute_referendum_result_by_regions(&joined).unwrap();

        assert_eq!(res.regions.len(), 2);
        assert_eq!(res.unmatched.num_rows, 2);

        let mut regions_total = [0u64; 5];
        for r in res.regions.iter() {
            for (idx, x) in r.tally.values().iter().enumerate() {
                regions_total[idx] += x;
            }
        }
        let matched: Vec<JoinedBallot> =
            joined.iter().filter(|jb| jb.area.is_some()).cloned().collect();
        assert_eq!(regions_total, total(&matched));

        let mut all_total = regions_total;
        for (idx, x) in res.unmatched.tally.values().iter().enumerate() {
            all_total[idx] += x;
        }
        assert_eq!(all_total, total(&joined));
        assert_eq!(all_total, [250, 61, 13, 96, 80]);
    }

    #[test]
    fn regions_are_ordered_and_named_from_first_row() {
        init();
        let joined: Vec<JoinedBallot> = vec![
            JoinedBallot {
                ballot: ballot(Some("75"), "1", [1, 0, 0, 1, 0]),
                area: Some(area("11", "Ile-de-France", "75", "Paris")),
            },
            JoinedBallot {
                ballot: ballot(Some("1"), "1", [1, 0, 0, 0, 1]),
                area: Some(area("084", "Auvergne", "1", "Ain")),
            },
        ];
        let res = compute_referendum_result_by_regions(&joined).unwrap();
        let codes: Vec<&str> = res.regions.iter().map(|r| r.code_reg.as_str()).collect();
        assert_eq!(codes, vec!["084", "11"]);
        assert_eq!(res.unmatched, UnmatchedTally::default());
    }

    #[test]
    fn overflow_is_reported() {
        init();
        let joined: Vec<JoinedBallot> = vec![
            JoinedBallot {
                ballot: ballot(Some("1"), "1", [u64::MAX, 0, 0, 0, 0]),
                area: Some(area("1", "Region A", "1", "Ain")),
            },
            JoinedBallot {
                ballot: ballot(Some("1"), "2", [1, 0, 0, 0, 0]),
                area: Some(area("1", "Region A", "1", "Ain")),
            },
        ];
        let res = compute_referendum_result_by_regions(&joined);
        assert_eq!(
            res,
            Err(ReferendumErrors::CountOverflow {
                column: "Registered",
                code_reg: Some("1".to_string())
            })
        );
    }

    #[test]
    fn large_counts_do_not_truncate() {
        init();
        let big: u64 = 3_000_000_000;
        let joined: Vec<JoinedBallot> = (0..20)
            .map(|idx| JoinedBallot {
                ballot: ballot(Some("1"), &idx.to_string(), [big, 0, 0, big, 0]),
                area: Some(area("1", "Region A", "1", "Ain")),
            })
            .collect();
        let res = compute_referendum_result_by_regions(&joined).unwrap();
        assert_eq!(res.regions[0].tally.registered, 60_000_000_000);
    }

    #[test]
    fn zero_expressed_ballots_gives_undefined_ratio() {
        let t = Tally {
            registered: 10,
            abstentions: 8,
            null: 2,
            choice_a: 0,
            choice_b: 0,
        };
        assert_eq!(compute_ratio(&t), Ratio::Undefined);
        assert_eq!(compute_ratio(&t).as_option(), None);
        let t = Tally {
            choice_a: 0,
            choice_b: 4,
            ..t
        };
        assert_eq!(compute_ratio(&t), Ratio::Value(0.0));
        let t = Tally {
            choice_a: 4,
            choice_b: 0,
            ..t
        };
        assert_eq!(compute_ratio(&t), Ratio::Value(1.0));
    }

    #[test]
    fn map_keeps_regions_with_geometry() {
        init();
        let results = vec![
            RegionResult {
                code_reg: "11".to_string(),
                name_reg: "Ile-de-France".to_string(),
                tally: Tally {
                    registered: 100,
                    abstentions: 10,
                    null: 5,
                    choice_a: 60,
                    choice_b: 25,
                },
            },
            RegionResult {
                code_reg: "24".to_string(),
                name_reg: "Centre".to_string(),
                tally: Tally {
                    registered: 10,
                    abstentions: 10,
                    ..Tally::default()
                },
            },
            RegionResult {
                code_reg: "94".to_string(),
                name_reg: "Corse".to_string(),
                tally: Tally {
                    choice_a: 1,
                    ..Tally::default()
                },
            },
        ];
        let geometries = vec![
            RegionGeometry {
                code: "24".to_string(),
                geometry: square(),
            },
            RegionGeometry {
                code: "11".to_string(),
                geometry: square(),
            },
            RegionGeometry {
                code: "53".to_string(),
                geometry: square(),
            },
        ];
        let res = build_region_map(&results, &geometries);
        let codes: Vec<&str> = res.iter().map(|m| m.result.code_reg.as_str()).collect();
        assert_eq!(codes, vec!["11", "24"]);
        assert_eq!(res[1].ratio, Ratio::Undefined);
        for m in res.iter() {
            if let Ratio::Value(x) = m.ratio {
                assert!((0.0..=1.0).contains(&x));
            }
        }
    }

    #[test]
    fn geometry_rings() {
        let g = Geometry::MultiPolygon(vec![
            vec![vec![(0.0, 0.0), (1.0, 1.0)], vec![(0.5, 0.5)]],
            vec![vec![(2.0, 2.0)]],
        ]);
        assert_eq!(g.rings().len(), 3);
        assert_eq!(square().rings().len(), 1);
    }
}
