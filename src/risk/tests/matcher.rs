use crate::risk::matcher::{find_match, normalize_key, normalize_text, singularize};

#[test]
fn normalization_lowercases_and_collapses_whitespace() {
    assert_eq!(normalize_text("  Grilled   SHRIMP  skewers "), "grilled shrimp skewers");
    assert_eq!(normalize_key("  Tree_Nut  "), "tree_nut");
    assert_eq!(normalize_key("\"peanut!\""), "peanut");
}

#[test]
fn normalization_strips_quoting_and_punctuation() {
    assert_eq!(
        normalize_text("an \"almond\" (croissant), fresh!"),
        "an almond croissant fresh"
    );
}

#[test]
fn singularize_is_naive_and_guards_single_letters() {
    assert_eq!(singularize("cats"), "cat");
    assert_eq!(singularize("cat"), "cat");
    assert_eq!(singularize("s"), "s");
}

#[test]
fn matching_is_case_and_plural_tolerant() {
    let candidates = ["peanut"];
    assert_eq!(
        find_match("I had Peanuts", candidates),
        Some("peanut".to_string())
    );
    assert_eq!(
        find_match("peanut brittle", candidates),
        Some("peanut".to_string())
    );
    assert_eq!(find_match("pine nuts", candidates), None);
}

#[test]
fn punctuation_separates_words_instead_of_joining_them() {
    // Hyphens and slashes become spaces, so compound spellings still expose
    // the allergen term rather than fusing into an unmatchable token.
    assert_eq!(normalize_text("peanut-butter & jelly"), "peanut butter jelly");
    assert_eq!(
        find_match("peanut-butter toast", ["peanut"]),
        Some("peanut".to_string())
    );
    assert_eq!(
        find_match("shrimp/crab mix", ["crab"]),
        Some("crab".to_string())
    );
}

#[test]
fn matching_respects_word_boundaries() {
    assert_eq!(find_match("peanutty spread", ["peanut"]), None);
    assert_eq!(find_match("crabapple pie", ["crab"]), None);
}

#[test]
fn longer_terms_win_over_their_prefixes() {
    let candidates = ["peanut", "peanut butter"];
    assert_eq!(
        find_match("peanut butter sandwich", candidates),
        Some("peanut butter".to_string())
    );
}

#[test]
fn length_ties_break_alphabetically_for_determinism() {
    // Same length, both present in the text; the alphabetically first term
    // must win on every run.
    let candidates = ["crab", "kiwi"];
    assert_eq!(
        find_match("kiwi and crab salad", candidates),
        Some("crab".to_string())
    );
}

#[test]
fn empty_inputs_never_match() {
    assert_eq!(find_match("", ["peanut"]), None);
    assert_eq!(find_match("peanut", []), None);
    assert_eq!(find_match("   ", ["peanut"]), None);
}
