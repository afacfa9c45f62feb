// tests/title_filter.rs
use internship_sentinel::discovery::filter::{clean_title, is_internship_title};

#[test]
fn whole_word_intern_forms_match_in_any_case() {
    for t in [
        "INTERN - Firmware",
        "Summer 2027 internship (Remote)",
        "Software Engineer Intern/Co-op",
        "Interns: Quant Research",
        "Internships in Operations",
    ] {
        assert!(is_internship_title(t), "expected match: {t}");
    }
}

#[test]
fn intern_as_a_prefix_of_another_word_does_not_match() {
    for t in [
        "International Tax Manager",
        "Internal Audit Lead",
        "Internet Security Engineer",
        "Interned Assets Analyst",
        "Senior Platform Engineer",
        "",
    ] {
        assert!(!is_internship_title(t), "unexpected match: {t}");
    }
}

#[test]
fn cleaned_titles_keep_their_classification() {
    let raw = "  Data&nbsp;Science\n  Intern &amp; Co-op  ";
    let cleaned = clean_title(raw);
    assert_eq!(cleaned, "Data Science Intern & Co-op");
    assert!(is_internship_title(&cleaned));
}
