// Reading the outline of the regions from a GeoJSON file.

use std::path::Path;

use serde::Deserialize;
use serde_json::Map as JSMap;

use crate::refmap::{io_common::path_string, *};

/// The property holding the region code in each feature.
pub const REGION_CODE_PROPERTY: &str = "code";

#[derive(Debug, Clone, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<JSMap<String, JSValue>>,
    geometry: Option<JSValue>,
}

/// Region codes may be written as strings or as numbers.
fn read_js_code(x: Option<&JSValue>) -> Option<String> {
    match x {
        Some(JSValue::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(JSValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn read_ring(js: &[Vec<f64>]) -> Option<Ring> {
    js.iter()
        .map(|pt| match pt.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        })
        .collect()
}

fn read_polygon(js: &[Vec<Vec<f64>>]) -> Option<Vec<Ring>> {
    js.iter().map(|r| read_ring(r)).collect()
}

fn read_geometry(path: &str, index: usize, js: &JSValue) -> RefmapResult<Geometry> {
    let kind = js
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("missing")
        .to_string();
    let coordinates = js.get("coordinates").cloned().unwrap_or(JSValue::Null);
    let geometry = match kind.as_str() {
        "Polygon" => {
            let c: Vec<Vec<Vec<f64>>> = serde_json::from_value(coordinates)
                .ok()
                .context(InvalidCoordinatesSnafu { path, index })?;
            read_polygon(&c).map(Geometry::Polygon)
        }
        "MultiPolygon" => {
            let c: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(coordinates)
                .ok()
                .context(InvalidCoordinatesSnafu { path, index })?;
            c.iter()
                .map(|p| read_polygon(p))
                .collect::<Option<Vec<Vec<Ring>>>>()
                .map(Geometry::MultiPolygon)
        }
        _ => {
            return UnsupportedGeometrySnafu { path, index, kind }.fail();
        }
    };
    geometry.context(InvalidCoordinatesSnafu { path, index })
}

pub fn read_region_geometries(path: &Path) -> RefmapResult<Vec<RegionGeometry>> {
    let p = path_string(path);
    info!("Attempting to read geometry file {:?}", p);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.as_str() })?;
    let fc: FeatureCollection =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path: p.as_str() })?;

    let mut res: Vec<RegionGeometry> = Vec::new();
    for (index, feature) in fc.features.iter().enumerate() {
        let code = read_js_code(
            feature
                .properties
                .as_ref()
                .and_then(|props| props.get(REGION_CODE_PROPERTY)),
        )
        .context(MissingRegionCodeSnafu {
            path: p.as_str(),
            index,
        })?;
        let geometry = match &feature.geometry {
            Some(js) => read_geometry(&p, index, js)?,
            None => {
                warn!("Feature {} ({}) of {:?} has no geometry, skipping", index, code, p);
                continue;
            }
        };
        debug!(
            "read_region_geometries: region {} with {} rings",
            code,
            geometry.rings().len()
        );
        res.push(RegionGeometry { code, geometry });
    }
    info!("Read {} region geometries from {:?}", res.len(), p);
    Ok(res)
}
