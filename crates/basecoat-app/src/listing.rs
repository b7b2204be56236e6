// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FormulaCatalog, FormulaId, FormulaRow, RowSurface};
use std::borrow::Cow;

/// Rows loaded from the listing endpoint plus the per-row visibility flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    columns: Vec<String>,
    rows: Vec<FormulaRow>,
    texts: Vec<String>,
    visible: Vec<bool>,
}

impl Listing {
    pub fn new(catalog: FormulaCatalog) -> Self {
        let texts = catalog.rows.iter().map(FormulaRow::text).collect();
        let visible = vec![true; catalog.rows.len()];
        Self {
            columns: catalog.columns,
            rows: catalog.rows,
            texts,
            visible,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, index: usize) -> Option<&FormulaRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(index, visible)| visible.then_some(index))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|visible| **visible).count()
    }
}

impl RowSurface for Listing {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.texts.get(index).map(|text| Cow::Borrowed(text.as_str()))
    }

    fn row_identifier(&self, index: usize) -> Option<FormulaId> {
        self.rows.get(index).and_then(|row| row.id.clone())
    }

    fn set_row_visible(&mut self, index: usize, visible: bool) {
        if let Some(slot) = self.visible.get_mut(index) {
            *slot = visible;
        }
    }
}
