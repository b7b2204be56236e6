// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::RowSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub total: usize,
    pub visible: usize,
}

impl FilterSummary {
    pub fn is_empty(self) -> bool {
        self.visible == 0
    }
}

/// Literal, case-insensitive substring test. An empty term matches anything.
pub fn row_matches(text: &str, term: &str) -> bool {
    case_insensitive_matcher(term)(text)
}

/// Builds the predicate once per pass so the term is uppercased a single time.
pub fn case_insensitive_matcher(term: &str) -> impl Fn(&str) -> bool {
    let needle = term.to_uppercase();
    move |text: &str| needle.is_empty() || text.to_uppercase().contains(needle.as_str())
}

/// Hides every row, then reveals the rows `matches` accepts.
pub fn apply_filter_with<S, P>(rows: &mut S, matches: P) -> FilterSummary
where
    S: RowSurface + ?Sized,
    P: Fn(&str) -> bool,
{
    let total = rows.row_count();
    for index in 0..total {
        rows.set_row_visible(index, false);
    }

    let matching = (0..total)
        .filter(|index| {
            rows.row_text(*index)
                .map(|text| matches(&text))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    for index in &matching {
        rows.set_row_visible(*index, true);
    }

    FilterSummary {
        total,
        visible: matching.len(),
    }
}

pub fn apply_filter<S>(rows: &mut S, term: &str) -> FilterSummary
where
    S: RowSurface + ?Sized,
{
    let summary = apply_filter_with(rows, case_insensitive_matcher(term));
    tracing::debug!(
        term,
        total = summary.total,
        visible = summary.visible,
        "filter applied"
    );
    summary
}
