// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

/// One formula record as the server rendered it into the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaRow {
    #[serde(default, deserialize_with = "deserialize_formula_id")]
    pub id: Option<FormulaId>,
    #[serde(default)]
    pub cells: Vec<String>,
}

impl FormulaRow {
    pub fn new<I, S>(id: Option<FormulaId>, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Full rendered text of the row, every cell included.
    pub fn text(&self) -> String {
        self.cells.join(" ")
    }
}

/// The listing page: header labels plus the rows in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaCatalog {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<FormulaRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    pub title: String,
    pub body: String,
}

impl crate::ModalSurface for ModalState {
    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
    }

    fn set_body(&mut self, body: &str) {
        body.clone_into(&mut self.body);
    }
}
