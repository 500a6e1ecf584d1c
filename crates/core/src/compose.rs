use crate::models::{Response, ResponseSection, SectionKind};

pub fn weather_section(location: &str, descriptor: &str) -> ResponseSection {
    ResponseSection {
        kind: SectionKind::Weather,
        body: format!("In {location} it's {descriptor}."),
    }
}

/// Stands in for the weather block when weather was the only thing asked
/// for and the provider had nothing.
pub fn weather_unavailable_section(location: &str) -> ResponseSection {
    ResponseSection {
        kind: SectionKind::Weather,
        body: format!("I couldn't get the current weather for {location}. Please try again later."),
    }
}

/// An empty list still produces a section saying nothing was found.
pub fn places_section(location: &str, places: &[String]) -> ResponseSection {
    let body = if places.is_empty() {
        format!("I couldn't find any specific tourist attractions in {location}.")
    } else {
        format!(
            "In {location} these are the places you can go:\n{}",
            places.join("\n")
        )
    };

    ResponseSection {
        kind: SectionKind::Places,
        body,
    }
}

/// `weather` is `None` when it was not requested or came back empty; `places`
/// is `None` only when it was not requested.
pub fn compose_response(location: &str, weather: Option<&str>, places: Option<&[String]>) -> Response {
    let mut sections = Vec::with_capacity(2);

    if let Some(descriptor) = weather {
        sections.push(weather_section(location, descriptor));
    }
    if let Some(places) = places {
        sections.push(places_section(location, places));
    }

    Response { sections }
}
