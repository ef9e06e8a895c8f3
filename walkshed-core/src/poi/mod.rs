//! POI retrieval: an ordered tag taxonomy, the Overpass retrieval loop
//! and per-category output files.

use std::path::{Path, PathBuf};

use geo::Rect;
use log::{info, warn};

use crate::Error;
use crate::crs::Crs;
use crate::io::write_point_set;
use crate::loading::OverpassClient;
use crate::loading::overpass::poi_group_query;
use crate::model::PointRecord;

/// One taxonomy entry: an ordered list of (tag key, accepted values)
/// filters, matched as a union.
#[derive(Debug, Clone)]
pub struct TagGroup {
    pub filters: Vec<(String, Vec<String>)>,
}

impl TagGroup {
    pub fn new<K, V>(filters: impl IntoIterator<Item = (K, Vec<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            filters: filters
                .into_iter()
                .map(|(k, vs)| (k.into(), vs.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Deterministic filename fragment: `key-value1value2` per filter,
    /// joined by underscores.
    pub fn slug(&self) -> String {
        self.filters
            .iter()
            .map(|(key, values)| format!("{key}-{}", values.join("")))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// The default amenity taxonomy of the 15-minute-city workflow, in its
/// original processing order.
pub fn default_taxonomy() -> Vec<TagGroup> {
    vec![
        TagGroup::new([("amenity", vec!["kindergarten"])]),
        TagGroup::new([("amenity", vec!["school", "college", "university"])]),
        TagGroup::new([("highway", vec!["bus_stop"])]),
        TagGroup::new([("amenity", vec!["bank", "atm"])]),
        TagGroup::new([(
            "amenity",
            vec![
                "public_building",
                "townhall",
                "community_centre",
                "conference_centre",
                "courthouse",
                "police",
                "fire_station",
                "post_office",
            ],
        )]),
        TagGroup::new([
            ("amenity", vec!["doctors", "dentist", "hospital", "clinic"]),
            ("healthcare", vec!["doctor", "dentist", "hospital", "clinic"]),
        ]),
        TagGroup::new([
            ("amenity", vec!["pharmacy"]),
            ("healthcare", vec!["pharmacy"]),
        ]),
        TagGroup::new([(
            "amenity",
            vec![
                "restaurant",
                "fast_food",
                "food_court",
                "cafe",
                "ice_cream",
                "pub",
                "biergarten",
                "bar",
            ],
        )]),
        TagGroup::new([
            ("shop", vec!["supermarket", "convenience"]),
            ("amenity", vec!["marketplace"]),
            ("building", vec!["retail"]),
        ]),
        TagGroup::new([(
            "shop",
            vec![
                "clothes",
                "fashion",
                "shoes",
                "jewelry",
                "computer",
                "electronics",
                "mobile_phone",
                "cosmetics",
                "beauty",
                "nails",
                "pet",
            ],
        )]),
        TagGroup::new([
            (
                "shop",
                vec![
                    "swimming_pool",
                    "sports",
                    "water_sports",
                    "fishing",
                    "hunting",
                ],
            ),
            (
                "leisure",
                vec![
                    "stadium",
                    "sports_centre",
                    "fitness_centre",
                    "track",
                    "bowling_alley",
                    "miniature_golf",
                    "golf_course",
                    "pitch",
                    "ice_rink",
                ],
            ),
        ]),
        TagGroup::new([
            ("tourism", vec!["museum", "gallery", "artwork"]),
            (
                "amenity",
                vec![
                    "theatre",
                    "library",
                    "public_bookcase",
                    "planetarium",
                    "arts_centre",
                    "studio",
                ],
            ),
        ]),
        TagGroup::new([
            ("landuse", vec!["allotments", "vineyard", "forest"]),
            ("leisure", vec!["park", "nature_reserve"]),
            ("natural", vec!["wood"]),
        ]),
    ]
}

/// Output path for a retrieved category.
pub fn category_path(out_dir: &Path, index: usize, group: &TagGroup) -> PathBuf {
    out_dir.join(format!("poi_{index:02}_{}.geojson", group.slug()))
}

/// Retrieve each tag group over the extent and write one point file per
/// non-empty category. A failed or empty query is logged and skipped; it
/// never aborts later groups. Returns the number of files written.
pub fn retrieve_pois(
    client: &OverpassClient,
    bbox: &Rect<f64>,
    groups: &[TagGroup],
    out_dir: &Path,
) -> Result<usize, Error> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = 0;

    for (index, group) in groups.iter().enumerate() {
        let slug = group.slug();

        let response = match client.query(&poi_group_query(bbox, group)) {
            Ok(response) => response,
            Err(e) => {
                warn!("Error retrieving POIs for {slug}: {e}");
                continue;
            }
        };

        // Nodes are kept as-is; ways and relations collapse to their
        // center, so only genuinely point-less elements drop out here.
        let points: Vec<PointRecord> = response
            .elements
            .iter()
            .filter_map(|e| {
                e.point()
                    .map(|p| PointRecord::new(e.name().map(str::to_owned), p))
            })
            .collect();

        if points.is_empty() {
            warn!("No POIs found for {slug}, skipping");
            continue;
        }

        let path = category_path(out_dir, index, group);
        write_point_set(&path, &points, Crs::Wgs84)?;
        info!("Saved {} POIs for {slug} to {}", points.len(), path.display());
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_deterministic() {
        let group = TagGroup::new([
            ("shop", vec!["supermarket", "convenience"]),
            ("amenity", vec!["marketplace"]),
        ]);
        assert_eq!(group.slug(), "shop-supermarketconvenience_amenity-marketplace");
    }

    #[test]
    fn taxonomy_order_is_stable() {
        let groups = default_taxonomy();
        assert_eq!(groups.len(), 13);
        assert_eq!(groups[0].slug(), "amenity-kindergarten");
        assert_eq!(groups[2].slug(), "highway-bus_stop");
        assert_eq!(
            category_path(Path::new("pois"), 8, &groups[8]),
            PathBuf::from("pois/poi_08_shop-supermarketconvenience_amenity-marketplace_building-retail.geojson")
        );
    }
}
