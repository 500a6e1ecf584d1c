use crate::models::{OsmType, ResolvedLocation};

pub const RELATION_AREA_OFFSET: u64 = 3_600_000_000;
pub const WAY_AREA_OFFSET: u64 = 2_400_000_000;

pub const DEFAULT_SEARCH_RADIUS_M: u32 = 5_000;

/// Overpass area id for an OSM object. Nodes have no area.
pub fn area_id(osm_type: OsmType, osm_id: u64) -> Option<u64> {
    match osm_type {
        OsmType::Relation => osm_id.checked_add(RELATION_AREA_OFFSET),
        OsmType::Way => osm_id.checked_add(WAY_AREA_OFFSET),
        OsmType::Node => None,
    }
}

/// Where a points-of-interest search should look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchScope {
    Area(u64),
    Radius {
        latitude: f64,
        longitude: f64,
        meters: u32,
    },
}

impl SearchScope {
    pub fn for_location(location: &ResolvedLocation, radius_m: u32) -> Self {
        match (location.osm_type, location.osm_id) {
            (Some(kind), Some(id)) => match area_id(kind, id) {
                Some(area) => Self::Area(area),
                None => Self::radius(location, radius_m),
            },
            _ => Self::radius(location, radius_m),
        }
    }

    fn radius(location: &ResolvedLocation, meters: u32) -> Self {
        Self::Radius {
            latitude: location.latitude,
            longitude: location.longitude,
            meters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_relations_and_ways() {
        assert_eq!(area_id(OsmType::Relation, 123), Some(3_600_000_123));
        assert_eq!(area_id(OsmType::Way, 123), Some(2_400_000_123));
        assert_eq!(area_id(OsmType::Node, 123), None);
    }

    #[test]
    fn node_locations_fall_back_to_radius() {
        let location = ResolvedLocation {
            latitude: 19.07,
            longitude: 72.87,
            osm_id: Some(42),
            osm_type: Some(OsmType::Node),
        };
        assert_eq!(
            SearchScope::for_location(&location, 5_000),
            SearchScope::Radius {
                latitude: 19.07,
                longitude: 72.87,
                meters: 5_000
            }
        );
    }

    #[test]
    fn missing_id_falls_back_to_radius() {
        let location = ResolvedLocation {
            latitude: 1.0,
            longitude: 2.0,
            osm_id: None,
            osm_type: Some(OsmType::Relation),
        };
        assert!(matches!(
            SearchScope::for_location(&location, 800),
            SearchScope::Radius { meters: 800, .. }
        ));
    }

    #[test]
    fn relation_locations_use_area() {
        let location = ResolvedLocation {
            latitude: 1.0,
            longitude: 2.0,
            osm_id: Some(7_888_990),
            osm_type: Some(OsmType::Relation),
        };
        assert_eq!(
            SearchScope::for_location(&location, 5_000),
            SearchScope::Area(3_607_888_990)
        );
    }
}
