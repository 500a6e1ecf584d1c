use crate::lexicon::Lexicon;
use crate::models::Intent;

pub fn classify_intent(lexicon: &Lexicon, text: &str) -> Intent {
    let lower = text.to_lowercase();

    let weather = contains_any(&lower, &lexicon.weather_keywords);
    let places = contains_any(&lower, &lexicon.places_keywords);

    Intent::from_flags(weather, places)
}

fn contains_any(input: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| input.contains(needle.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Intent {
        classify_intent(&Lexicon::builtin(), text)
    }

    #[test]
    fn weather_only() {
        assert_eq!(classify("What's the weather in Mumbai?"), Intent::Weather);
        assert_eq!(classify("is it RAINING in pune"), Intent::Weather);
    }

    #[test]
    fn places_only() {
        assert_eq!(classify("plan my trip to bangalore"), Intent::Places);
    }

    #[test]
    fn both_when_both_sets_match() {
        assert_eq!(
            classify("planning a trip to Goa, how is the forecast?"),
            Intent::Both
        );
    }

    #[test]
    fn defaults_to_places() {
        assert_eq!(classify("bangalore"), Intent::Places);
        assert_eq!(classify(""), Intent::Places);
    }

    #[test]
    fn is_deterministic() {
        let text = "hot museums near Delhi";
        assert_eq!(classify(text), classify(text));
        assert_eq!(classify(text), Intent::Both);
    }
}
