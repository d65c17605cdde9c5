/*!

This is the long-form manual for `referendum` and `refmap`.

## Input files

Four files are read, by default from the `data` directory:

* `referendum.csv` the results of the referendum, one row per town. The file is separated by semicolons
  and must contain the columns `Department code`, `Town code`, `Registered`, `Abstentions`, `Null`,
  `Choice A` and `Choice B`. The columns `Department name` and `Town name` are read when present.
  Empty counts are read as zero.
* `regions.csv` the regions, comma separated, with the columns `code` and `name`.
* `departments.csv` the departments, comma separated, with the columns `region_code`, `code` and `name`.
* `regions.geojson` the outline of each region, as a GeoJSON `FeatureCollection`. Each feature has a `code`
  property (string or number) and a `Polygon` or `MultiPolygon` geometry.

Other columns and properties are ignored. A missing required column stops the program before any
processing.

## Department codes

The referendum file and the department table do not write department codes the same way:

| Department       | referendum file | department table |
|------------------|-----------------|------------------|
| Ardèche          | `7`             | `07`             |
| Corse-du-Sud     | `2A`            | `2A`             |
| Guadeloupe       | `ZA`            | `971`            |
| French abroad    | `ZZ`            |                  |

The referendum rows whose code contains `Z` (overseas departments, territories and French citizens
living abroad) are not placed on the map. On the department table side, three-digit codes are the
overseas departments and are removed, the other numeric codes lose their leading zeros. See
[`crate::territory`].

## Results

The rows of the referendum file are summed by region. A row whose department does not match any
department of the table is not counted in any region: the number of such rows and their counts are
reported separately (`unmatched` in the summary), so that the totals of the file can always be
recovered.

For each region, the ratio is the share of `Choice A` among the expressed ballots
(`Choice A / (Choice A + Choice B)`): registered voters who abstained or voted null do not count.
When a region has no expressed ballot, the ratio is undefined. It is reported as `null` in the JSON
summary and drawn in grey on the map.

## Configuration

Instead of passing every path on the command line, a JSON configuration can be given with `--config`.
Relative paths are resolved from the directory of the configuration file.

```json
{
  "inputs": {
    "referendumFile": "referendum.csv",
    "regionsFile": "regions.csv",
    "departmentsFile": "departments.csv",
    "geometryFile": "regions.geojson"
  },
  "outputSettings": {
    "mapFile": "referendum_map.svg",
    "summaryFile": "summary.json",
    "mapTitle": "Referendum: share of Choice A"
  }
}
```

All the keys are optional. The command line flags take precedence over the configuration.

## Checking the results

The `--reference` option takes a JSON summary previously written with `--out`. The program fails and
prints the differences if the new summary is not identical.

*/
