use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::DataError;

// ---------------------------------------------------------------------------
// GeoJSON wire types (only what the map needs)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, JsonValue>,
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: JsonValue,
}

type Ring = Vec<[f64; 2]>;

// ---------------------------------------------------------------------------
// Projected boundaries
// ---------------------------------------------------------------------------

/// One named area: a list of polygons, each an exterior ring followed by
/// its holes. Coordinates are already projected.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub name: String,
    pub polygons: Vec<Vec<Ring>>,
    /// Fill triangles of each polygon's exterior ring, computed once.
    pub triangles: Vec<Vec<[usize; 3]>>,
}

impl District {
    pub fn new(name: String, polygons: Vec<Vec<Ring>>) -> Self {
        let triangles = polygons
            .iter()
            .map(|rings| rings.first().map(|outer| triangulate(outer)).unwrap_or_default())
            .collect();
        Self {
            name,
            polygons,
            triangles,
        }
    }

    /// Even-odd test per polygon, so holes are honoured.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        self.polygons.iter().any(|rings| {
            rings.iter().filter(|ring| ring_contains(ring, p)).count() % 2 == 1
        })
    }
}

/// All boundary features of a GeoJSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundaries {
    pub districts: Vec<District>,
}

impl Boundaries {
    pub fn load(path: &Path, name_property: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading GeoJSON file {}", path.display()))?;
        Self::from_geojson(&text, name_property)
    }

    /// Parse a FeatureCollection of Polygon / MultiPolygon features.
    ///
    /// Features without geometry or without the name property are skipped
    /// with a warning; malformed coordinates are an error.
    pub fn from_geojson(text: &str, name_property: &str) -> Result<Self> {
        let collection: FeatureCollection =
            serde_json::from_str(text).context("parsing GeoJSON FeatureCollection")?;

        let mut districts = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let name = match feature.properties.get(name_property) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => {
                    log::warn!("feature {index}: no '{name_property}' property, skipped");
                    continue;
                }
                Some(other) => other.to_string(),
            };
            let Some(geometry) = feature.geometry else {
                log::warn!("feature {index} ({name}): no geometry, skipped");
                continue;
            };

            let polygons = match geometry.kind.as_str() {
                "Polygon" => vec![parse_polygon(geometry.coordinates, index)?],
                "MultiPolygon" => {
                    let parts: Vec<JsonValue> = serde_json::from_value(geometry.coordinates)
                        .map_err(|e| DataError::BadGeometry {
                            index,
                            reason: e.to_string(),
                        })?;
                    parts
                        .into_iter()
                        .map(|part| parse_polygon(part, index))
                        .collect::<Result<Vec<_>>>()?
                }
                other => {
                    log::warn!("feature {index} ({name}): unsupported geometry {other}, skipped");
                    continue;
                }
            };

            districts.push(District::new(name, polygons));
        }

        log::debug!("parsed {} boundary features", districts.len());
        Ok(Boundaries { districts })
    }

    /// District under a projected point, if any.
    pub fn hit(&self, p: [f64; 2]) -> Option<&District> {
        self.districts.iter().find(|d| d.contains(p))
    }

    /// Projected bounding box `(min, max)` of every ring.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut points = self
            .districts
            .iter()
            .flat_map(|d| d.polygons.iter())
            .flat_map(|rings| rings.iter())
            .flat_map(|ring| ring.iter());
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            ([lo[0].min(p[0]), lo[1].min(p[1])], [hi[0].max(p[0]), hi[1].max(p[1])])
        }))
    }
}

fn parse_polygon(coords: JsonValue, index: usize) -> Result<Vec<Ring>> {
    let rings: Vec<Vec<Vec<f64>>> =
        serde_json::from_value(coords).map_err(|e| DataError::BadGeometry {
            index,
            reason: e.to_string(),
        })?;

    rings
        .into_iter()
        .map(|ring| -> Result<Ring> {
            let mut out: Ring = ring
                .iter()
                .map(|pos| match pos.as_slice() {
                    [lon, lat, ..] => Ok(mercator(*lon, *lat)),
                    _ => Err(DataError::BadGeometry {
                        index,
                        reason: "position with fewer than two coordinates".to_string(),
                    }),
                })
                .collect::<Result<_, _>>()?;
            // GeoJSON rings repeat the first point at the end.
            if out.len() > 1 && out.first() == out.last() {
                out.pop();
            }
            if out.len() < 3 {
                return Err(DataError::BadGeometry {
                    index,
                    reason: "ring with fewer than three distinct points".to_string(),
                }
                .into());
            }
            Ok(out)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Web Mercator in degrees: longitude unchanged, latitude stretched.
pub fn mercator(lon: f64, lat: f64) -> [f64; 2] {
    let phi = lat.clamp(-85.0, 85.0).to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln().to_degrees();
    [lon, y]
}

/// Ray-casting point-in-ring test.
pub fn ring_contains(ring: &[[f64; 2]], p: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a[1] > p[1]) != (b[1] > p[1])
            && p[0] < (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0]
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum::<f64>()
        / 2.0
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of a simple ring (holes are not cut out).
///
/// Returns index triples into `ring`. Degenerate leftovers are fanned.
pub fn triangulate(ring: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let mut idx: Vec<usize> = (0..n).collect();
    if signed_area(ring) < 0.0 {
        idx.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut stalled = 0;
    let mut i = 0;
    while idx.len() > 3 && stalled < idx.len() {
        let m = idx.len();
        let (pi, ci, ni) = (idx[(i + m - 1) % m], idx[i % m], idx[(i + 1) % m]);
        let (a, b, c) = (ring[pi], ring[ci], ring[ni]);

        let is_ear = cross(a, b, c) > 0.0
            && !idx
                .iter()
                .filter(|&&k| k != pi && k != ci && k != ni)
                .any(|&k| in_triangle(ring[k], a, b, c));

        if is_ear {
            triangles.push([pi, ci, ni]);
            idx.remove(i % m);
            stalled = 0;
        } else {
            i += 1;
            stalled += 1;
        }
    }

    // Whatever remains (a triangle, or a self-touching rest) is fanned.
    for k in 1..idx.len().saturating_sub(1) {
        triangles.push([idx[0], idx[k], idx[k + 1]]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "planning_area": "ALPHA" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "planning_area": "BETA" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[3,0],[4,0],[4,1],[3,1],[3,0]]],
                        [[[5,0],[8,0],[8,3],[5,3],[5,0]], [[6,1],[7,1],[7,2],[6,2],[6,1]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "unnamed" },
                "geometry": { "type": "Point", "coordinates": [1, 1] }
            },
            {
                "type": "Feature",
                "properties": { "planning_area": "LINE" },
                "geometry": { "type": "LineString", "coordinates": [[0,0],[1,1]] }
            }
        ]
    }"#;

    #[test]
    fn parses_polygons_and_skips_the_rest() {
        let b = Boundaries::from_geojson(SQUARES, "planning_area").unwrap();
        let names: Vec<_> = b.districts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["ALPHA", "BETA"]);
        assert_eq!(b.districts[0].polygons[0][0].len(), 4);
        assert_eq!(b.districts[1].polygons.len(), 2);
        assert_eq!(b.districts[1].polygons[1].len(), 2);
        assert_eq!(b.districts[0].triangles, vec![triangulate(&b.districts[0].polygons[0][0])]);
        assert_eq!(b.districts[1].triangles.len(), 2);
    }

    #[test]
    fn hit_test_honours_holes() {
        let b = Boundaries::from_geojson(SQUARES, "planning_area").unwrap();
        assert_eq!(b.hit(mercator(1.0, 1.0)).map(|d| d.name.as_str()), Some("ALPHA"));
        assert_eq!(b.hit(mercator(3.5, 0.5)).map(|d| d.name.as_str()), Some("BETA"));
        assert_eq!(b.hit(mercator(5.5, 2.5)).map(|d| d.name.as_str()), Some("BETA"));
        assert!(b.hit(mercator(6.5, 1.5)).is_none());
        assert!(b.hit(mercator(10.0, 10.0)).is_none());
    }

    #[test]
    fn bounds_cover_every_ring() {
        let b = Boundaries::from_geojson(SQUARES, "planning_area").unwrap();
        let (lo, hi) = b.bounds().unwrap();
        assert_eq!(lo[0], 0.0);
        assert_eq!(hi[0], 8.0);
        assert!(hi[1] > 3.0 && hi[1] < 3.1);
        assert!(Boundaries::default().bounds().is_none());
    }

    #[test]
    fn malformed_coordinates_are_errors() {
        let bad = r#"{"features":[{"properties":{"planning_area":"X"},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,1]]]}}]}"#;
        assert!(Boundaries::from_geojson(bad, "planning_area").is_err());
        let bad = r#"{"features":[{"properties":{"planning_area":"X"},
            "geometry":{"type":"Polygon","coordinates":"nope"}}]}"#;
        assert!(Boundaries::from_geojson(bad, "planning_area").is_err());
    }

    #[test]
    fn triangulates_concave_ring() {
        // an L shape, area 3
        let ring = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
        let tris = triangulate(&ring);
        assert_eq!(tris.len(), 4);
        let area: f64 = tris
            .iter()
            .map(|t| cross(ring[t[0]], ring[t[1]], ring[t[2]]).abs() / 2.0)
            .sum();
        assert!((area - 3.0).abs() < 1e-9);
    }

    #[test]
    fn triangulation_ignores_winding() {
        let cw = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        assert_eq!(triangulate(&cw).len(), 2);
        assert!(triangulate(&cw[..2]).is_empty());
    }

    #[test]
    fn mercator_keeps_equator_and_longitude() {
        let [x, y] = mercator(103.8, 0.0);
        assert_eq!(x, 103.8);
        assert!(y.abs() < 1e-12);
        let [_, y] = mercator(0.0, 1.35);
        assert!(y > 1.35 && y < 1.36);
    }
}
