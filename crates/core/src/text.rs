/// Upper-cases every letter that follows a non-letter and lower-cases the rest,
/// so `"new york"` becomes `"New York"` and `"st. louis"` becomes `"St. Louis"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }

    out
}

/// Drops every char that is not a word char (alphanumeric or `_`) or whitespace.
pub fn strip_punctuation(word: &str) -> String {
    word.chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_' || ch.is_whitespace())
        .collect()
}

pub fn trim_edge_punctuation(word: &str) -> &str {
    word.trim_matches(|ch| matches!(ch, '.' | ',' | '!' | '?' | ';' | ':'))
}

pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_like_place_names() {
        assert_eq!(title_case("bangalore"), "Bangalore");
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("st. louis"), "St. Louis");
        assert_eq!(title_case("EIFFEL tower"), "Eiffel Tower");
    }

    #[test]
    fn strips_punctuation_inside_tokens() {
        assert_eq!(strip_punctuation("What's"), "Whats");
        assert_eq!(strip_punctuation("Mumbai?"), "Mumbai");
        assert_eq!(trim_edge_punctuation("Goa!!"), "Goa");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_text("  weather \n in\tGoa "), "weather in Goa");
    }
}
