//! Terminal failures of a concierge request.

use thiserror::Error;

use crate::models::ReplyOutcome;

pub const NO_LOCATION_MESSAGE: &str =
    "I couldn't identify the location you want to visit. Please specify a city.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConciergeError {
    /// The extractor found no place mention.
    #[error("no location found in query")]
    NoLocationFound,

    /// The geocoder returned no candidates.
    #[error("no geocode match for '{location}'")]
    GeocodeMiss { location: String },

    /// A collaborator variant is missing credentials.
    #[error("{component} is not configured")]
    Configuration { component: String },
}

impl ConciergeError {
    pub fn geocode_miss<S: Into<String>>(location: S) -> Self {
        Self::GeocodeMiss {
            location: location.into(),
        }
    }

    pub fn configuration<S: Into<String>>(component: S) -> Self {
        Self::Configuration {
            component: component.into(),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoLocationFound => NO_LOCATION_MESSAGE.to_string(),
            Self::GeocodeMiss { location } => format!(
                "I couldn't find the location '{location}'. Please check the spelling or try a major city."
            ),
            Self::Configuration { component } => format!(
                "The {component} is not configured. Please contact the service administrator."
            ),
        }
    }

    pub fn outcome(&self) -> ReplyOutcome {
        match self {
            Self::NoLocationFound => ReplyOutcome::NoLocation,
            Self::GeocodeMiss { .. } => ReplyOutcome::GeocodeMiss,
            Self::Configuration { .. } => ReplyOutcome::ConfigurationError,
        }
    }
}
