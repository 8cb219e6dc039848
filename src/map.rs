use std::collections::{BTreeMap, BTreeSet};

use crate::config::PanelConfig;
use crate::record::FarmRecord;

/// Marker colors assigned to municipalities in sorted order.
const BASE_COLORS: [&str; 11] = [
    "red",
    "blue",
    "green",
    "purple",
    "orange",
    "darkred",
    "lightgray",
    "beige",
    "darkblue",
    "cadetblue",
    "darkgreen",
];

/// One marker on the family map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub family: String,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Markers for the map-eligible records, in record order.
pub fn map_points(records: &[FarmRecord]) -> Vec<MapPoint> {
    records
        .iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(MapPoint {
                family: r.family.clone(),
                municipality: r.municipality.clone(),
                latitude,
                longitude,
            })
        })
        .collect()
}

/// Mean position of the markers, or the configured fallback.
pub fn map_center(points: &[MapPoint], config: &PanelConfig) -> (f64, f64) {
    if points.is_empty() {
        return config.map_fallback_center;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    (lat, lon)
}

/// Legend colors keyed by municipality.
///
/// Municipalities beyond the base palette get generated hex colors that are
/// stable across renders.
pub fn municipality_colors(points: &[MapPoint]) -> BTreeMap<String, String> {
    let municipalities: BTreeSet<&str> = points.iter().map(|p| p.municipality.as_str()).collect();
    municipalities
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let color = match BASE_COLORS.get(i) {
                Some(c) => c.to_string(),
                None => generated_color(i),
            };
            (m.to_string(), color)
        })
        .collect()
}

fn generated_color(index: usize) -> String {
    let mixed = (index as u32).wrapping_mul(0x9E37_79B1) >> 8;
    format!("#{:06X}", mixed & 0xFF_FFFF)
}

/// The record behind a clicked marker: the first map-eligible record within
/// `tolerance` of (`lat`, `lon`) on both axes.
pub fn record_at<'a>(
    records: &'a [FarmRecord],
    lat: f64,
    lon: f64,
    tolerance: f64,
) -> Option<&'a FarmRecord> {
    records.iter().find(|r| {
        r.coordinates()
            .is_some_and(|(rlat, rlon)| (rlat - lat).abs() < tolerance && (rlon - lon).abs() < tolerance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_records;
    use crate::record::records;

    #[test]
    fn only_map_eligible_records_become_points() {
        let recs = records(&sample_records());
        let points = map_points(&recs);
        assert_eq!(points.len(), recs.len() - 1);
        assert!(points.iter().all(|p| p.family != "Oliveira"));
    }

    #[test]
    fn empty_map_centers_on_fallback() {
        let cfg = PanelConfig::default();
        assert_eq!(map_center(&[], &cfg), (-10.57, -37.38));
    }

    #[test]
    fn center_is_mean_position() {
        let points = vec![
            MapPoint {
                family: "a".into(),
                municipality: "X".into(),
                latitude: -10.0,
                longitude: -37.0,
            },
            MapPoint {
                family: "b".into(),
                municipality: "Y".into(),
                latitude: -11.0,
                longitude: -38.0,
            },
        ];
        assert_eq!(map_center(&points, &PanelConfig::default()), (-10.5, -37.5));
    }

    #[test]
    fn colors_follow_sorted_municipalities_and_overflow_to_hex() {
        let points: Vec<MapPoint> = (0..13)
            .map(|i| MapPoint {
                family: format!("f{i}"),
                municipality: format!("M{i:02}"),
                latitude: 0.0,
                longitude: 0.0,
            })
            .collect();
        let colors = municipality_colors(&points);
        assert_eq!(colors["M00"], "red");
        assert_eq!(colors["M10"], "darkgreen");
        assert!(colors["M11"].starts_with('#'));
        assert_eq!(colors["M11"].len(), 7);
        assert_ne!(colors["M11"], colors["M12"]);
        assert_eq!(municipality_colors(&points), colors);
    }

    #[test]
    fn clicked_marker_resolves_within_tolerance() {
        let recs = records(&sample_records());
        let hit = record_at(&recs, -10.910001, -37.650001, 0.00001).unwrap();
        assert_eq!(hit.family, "Silva");
        assert!(record_at(&recs, -10.95, -37.65, 0.00001).is_none());
    }
}
