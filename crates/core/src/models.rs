use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Weather,
    Places,
    Both,
}

impl Intent {
    pub fn from_flags(weather: bool, places: bool) -> Self {
        match (weather, places) {
            (true, true) => Self::Both,
            (true, false) => Self::Weather,
            _ => Self::Places,
        }
    }

    /// Case-insensitive parse of `Weather`, `Places` or `Both`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "weather" => Some(Self::Weather),
            "places" => Some(Self::Places),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn wants_weather(self) -> bool {
        matches!(self, Self::Weather | Self::Both)
    }

    pub fn wants_places(self) -> bool {
        matches!(self, Self::Places | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "Weather",
            Self::Places => "Places",
            Self::Both => "Both",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl OsmType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "node" | "n" => Some(Self::Node),
            "way" | "w" => Some(Self::Way),
            "relation" | "r" => Some(Self::Relation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// One geocoder hit. Built once by a geocoder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub osm_id: Option<u64>,
    #[serde(default)]
    pub osm_type: Option<OsmType>,
    /// ISO 3166-1 alpha-2, upper case.
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub admin_level: Option<i32>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl GeocodeCandidate {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            osm_id: None,
            osm_type: None,
            country_code: None,
            admin_level: None,
            population: None,
            display_name: None,
        }
    }

    pub fn resolve(&self) -> ResolvedLocation {
        ResolvedLocation {
            latitude: self.latitude,
            longitude: self.longitude,
            osm_id: self.osm_id,
            osm_type: self.osm_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub osm_id: Option<u64>,
    pub osm_type: Option<OsmType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub location: Option<String>,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Weather,
    Places,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSection {
    pub kind: SectionKind,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub sections: Vec<ResponseSection>,
}

impl Response {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ResponseSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.body.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Answered,
    NoLocation,
    GeocodeMiss,
    ConfigurationError,
}

impl ReplyOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::NoLocation => "no_location",
            Self::GeocodeMiss => "geocode_miss",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeReply {
    pub reply_text: String,
    pub outcome: ReplyOutcome,
    pub intent: Option<Intent>,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_flags_default_to_places() {
        assert_eq!(Intent::from_flags(false, false), Intent::Places);
        assert_eq!(Intent::from_flags(true, true), Intent::Both);
        assert_eq!(Intent::from_flags(true, false), Intent::Weather);
    }

    #[test]
    fn response_renders_with_blank_lines() {
        let response = Response {
            sections: vec![
                ResponseSection {
                    kind: SectionKind::Weather,
                    body: "a".to_string(),
                },
                ResponseSection {
                    kind: SectionKind::Places,
                    body: "b".to_string(),
                },
            ],
        };
        assert_eq!(response.render(), "a\n\nb");
        assert_eq!(Response::default().render(), "");
    }
}
