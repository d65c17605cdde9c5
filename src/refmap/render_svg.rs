// Drawing the map of the results as an SVG choropleth.

use std::path::Path;

use crate::refmap::{io_common::path_string, *};

const WIDTH: f64 = 900.0;
const MARGIN: f64 = 20.0;
const TITLE_HEIGHT: f64 = 40.0;
const LEGEND_WIDTH: f64 = 140.0;
const LEGEND_BAR_HEIGHT: f64 = 200.0;
const MIN_HEIGHT: f64 = 340.0;

// Light to dark blue.
const LOW_COLOR: (u8, u8, u8) = (239, 243, 255);
const HIGH_COLOR: (u8, u8, u8) = (8, 69, 148);
const UNDEFINED_COLOR: &str = "#cccccc";

/// Equirectangular projection of the bounding box of the map into the drawing area.
#[derive(Debug, Clone, Copy)]
struct Projection {
    min_lon: f64,
    max_lat: f64,
    // Shrinks the longitudes to keep the shapes at mid latitudes.
    lon_factor: f64,
    scale: f64,
}

impl Projection {
    fn new(map: &[MapRegion]) -> Option<Projection> {
        let points: Vec<(f64, f64)> = map
            .iter()
            .flat_map(|m| m.geometry.rings().into_iter().flatten().cloned())
            .collect();
        if points.is_empty() {
            return None;
        }
        let min_lon = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_lon = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_lat = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_lat = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let lon_factor = ((min_lat + max_lat) / 2.0).to_radians().cos().abs().max(0.1);
        let span_x = (max_lon - min_lon) * lon_factor;
        let span_y = max_lat - min_lat;
        let span = span_x.max(span_y);
        let scale = if span > 0.0 {
            (WIDTH - 2.0 * MARGIN - LEGEND_WIDTH) / span
        } else {
            1.0
        };
        Some(Projection {
            min_lon,
            max_lat,
            lon_factor,
            scale,
        })
    }

    fn project(&self, (lon, lat): (f64, f64)) -> (f64, f64) {
        (
            MARGIN + (lon - self.min_lon) * self.lon_factor * self.scale,
            MARGIN + TITLE_HEIGHT + (self.max_lat - lat) * self.scale,
        )
    }
}

fn escape_xml(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&apos;"),
            c => res.push(c),
        }
    }
    res
}

/// Linear interpolation between the two ends of the color scale, `t` in [0, 1].
fn scale_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(LOW_COLOR.0, HIGH_COLOR.0),
        mix(LOW_COLOR.1, HIGH_COLOR.1),
        mix(LOW_COLOR.2, HIGH_COLOR.2)
    )
}

/// The smallest and largest defined ratios.
fn ratio_range(map: &[MapRegion]) -> Option<(f64, f64)> {
    let values: Vec<f64> = map.iter().filter_map(|m| m.ratio.as_option()).collect();
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

fn fill_color(ratio: Ratio, range: Option<(f64, f64)>) -> String {
    match (ratio, range) {
        (Ratio::Value(x), Some((min, max))) if max > min => scale_color((x - min) / (max - min)),
        (Ratio::Value(_), _) => scale_color(0.5),
        (Ratio::Undefined, _) => UNDEFINED_COLOR.to_string(),
    }
}

fn path_data(geometry: &Geometry, proj: &Projection) -> String {
    let mut d = String::new();
    for ring in geometry.rings() {
        for (idx, pt) in ring.iter().enumerate() {
            let (x, y) = proj.project(*pt);
            let cmd = if idx == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{}{:.2},{:.2} ", cmd, x, y));
        }
        if !ring.is_empty() {
            d.push_str("Z ");
        }
    }
    d.trim_end().to_string()
}

fn legend(range: Option<(f64, f64)>, has_undefined: bool, height: f64) -> Vec<String> {
    let x = WIDTH - LEGEND_WIDTH + MARGIN;
    let y = MARGIN + TITLE_HEIGHT;
    let mut lines: Vec<String> = Vec::new();
    if let Some((min, max)) = range {
        lines.push(format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"20\" height=\"{:.1}\" fill=\"url(#ratio-scale)\" stroke=\"#333333\" stroke-width=\"0.5\"/>",
            x, y, LEGEND_BAR_HEIGHT
        ));
        lines.push(format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" dominant-baseline=\"hanging\">{:.3}</text>",
            x + 28.0,
            y,
            max
        ));
        lines.push(format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{:.3}</text>",
            x + 28.0,
            y + LEGEND_BAR_HEIGHT,
            min
        ));
    }
    if has_undefined {
        let uy = (y + LEGEND_BAR_HEIGHT + 20.0).min(height - MARGIN - 14.0);
        lines.push(format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"20\" height=\"14\" fill=\"{}\" stroke=\"#333333\" stroke-width=\"0.5\"/>",
            x, uy, UNDEFINED_COLOR
        ));
        lines.push(format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">undefined</text>",
            x + 28.0,
            uy + 12.0
        ));
    }
    lines
}

/// Draws the regions, shaded by their ratio, with a legend.
pub fn render_choropleth(map: &[MapRegion], title: &str) -> String {
    let proj = Projection::new(map);
    let range = ratio_range(map);
    let has_undefined = map.iter().any(|m| m.ratio == Ratio::Undefined);

    let height = match &proj {
        Some(p) => {
            let max_y = map
                .iter()
                .flat_map(|m| m.geometry.rings().into_iter().flatten().cloned())
                .map(|pt| p.project(pt).1)
                .fold(0.0, f64::max);
            (max_y + MARGIN).max(MIN_HEIGHT)
        }
        None => MIN_HEIGHT,
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">",
        WIDTH, height, WIDTH, height
    ));
    lines.push("<defs>".to_string());
    lines.push(
        "<linearGradient id=\"ratio-scale\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">".to_string(),
    );
    lines.push(format!(
        "<stop offset=\"0\" stop-color=\"{}\"/>",
        scale_color(1.0)
    ));
    lines.push(format!(
        "<stop offset=\"1\" stop-color=\"{}\"/>",
        scale_color(0.0)
    ));
    lines.push("</linearGradient>".to_string());
    lines.push("</defs>".to_string());
    lines.push(format!(
        "<rect x=\"0\" y=\"0\" width=\"{:.0}\" height=\"{:.0}\" fill=\"#ffffff\"/>",
        WIDTH, height
    ));
    lines.push(format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"18\" font-family=\"sans-serif\">{}</text>",
        MARGIN,
        MARGIN + 10.0,
        escape_xml(title)
    ));

    match proj {
        Some(p) => {
            for m in map.iter() {
                let label = match m.ratio {
                    Ratio::Value(x) => format!("{}: {:.4}", m.result.name_reg, x),
                    Ratio::Undefined => format!("{}: undefined", m.result.name_reg),
                };
                lines.push(format!(
                    "<path id=\"region-{}\" d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"#ffffff\" stroke-width=\"0.8\"><title>{}</title></path>",
                    escape_xml(&m.result.code_reg),
                    path_data(&m.geometry, &p),
                    fill_color(m.ratio, range),
                    escape_xml(&label)
                ));
            }
        }
        None => {
            lines.push(format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"14\">No region to display</text>",
                MARGIN,
                MARGIN + TITLE_HEIGHT + 20.0
            ));
        }
    }

    lines.extend(legend(range, has_undefined, height));
    lines.push("</svg>".to_string());
    lines.join("\n")
}

pub fn write_choropleth(path: &Path, map: &[MapRegion], title: &str) -> RefmapResult<()> {
    let p = path_string(path);
    info!("Writing map of {} regions to {:?}", map.len(), p);
    let svg = render_choropleth(map, title);
    fs::write(path, svg).context(WritingOutputSnafu { path: p })
}
