use std::cmp::Ordering;

use crate::model::{TestCase, TestState};

/// Search text plus the result state a test must have to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFilter {
    pub search: String,
    pub state: TestState,
}

impl TestFilter {
    pub fn new(search: impl Into<String>, state: TestState) -> Self {
        Self {
            search: search.into(),
            state,
        }
    }
}

impl Default for TestFilter {
    fn default() -> Self {
        Self::new(String::new(), TestState::All)
    }
}

pub fn is_test_filter_match(test: &TestCase, filter: &TestFilter) -> bool {
    if filter.state != TestState::All && test.result() != filter.state {
        return false;
    }

    let pattern = filter.search.trim();
    pattern.is_empty() || contains_ignore_case(&test.unique_name, pattern)
}

/// Display name first, unique name as tie-break, both ignoring case.
pub fn compare_tests(a: &TestCase, b: &TestCase) -> Ordering {
    compare_ignore_case(&a.display_name, &b.display_name)
        .then_with(|| compare_ignore_case(&a.unique_name, &b.unique_name))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Ordinal comparison of the case-folded characters.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars().map(fold_char).cmp(b.chars().map(fold_char))
}

fn fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Simple one-to-one upper-casing: characters whose upper case is more than
/// one character (`ß` -> `SS`) are left alone.
fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}
