// src/discovery/filter.rs
//! Internship title heuristic and title cleanup shared by every adapter.

use once_cell::sync::Lazy;
use regex::Regex;

// "Intern", "Interns", "Internship", "Internships" as a whole word.
static RE_INTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bintern(?:ship)?s?\b").expect("static intern regex"));

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

pub fn is_internship_title(title: &str) -> bool {
    RE_INTERN.is_match(title)
}

/// Decode HTML entities and collapse whitespace. Boards like Greenhouse
/// occasionally return `&amp;` inside titles.
pub fn clean_title(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_intern_variants() {
        for t in [
            "Software Intern",
            "2025 Internship Program",
            "Interns Wanted",
            "Summer Internships - Data",
            "intern, backend",
            "Co-Intern (Hardware)",
        ] {
            assert!(is_internship_title(t), "expected match: {t}");
        }
    }

    #[test]
    fn rejects_words_that_merely_start_with_intern() {
        for t in [
            "International Sales Rep",
            "Internal Tools Engineer",
            "Internet Infrastructure SRE",
            "Senior Engineer",
        ] {
            assert!(!is_internship_title(t), "unexpected match: {t}");
        }
    }

    #[test]
    fn clean_title_decodes_and_collapses() {
        assert_eq!(
            clean_title("  R&amp;D   Intern\n(Summer) "),
            "R&D Intern (Summer)"
        );
    }
}
