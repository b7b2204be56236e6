// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::FormulaId;
use std::borrow::Cow;

/// Read/toggle access to rows that something else rendered. Implementors
/// never create, drop, or reorder rows through this trait.
pub trait RowSurface {
    fn row_count(&self) -> usize;
    fn row_text(&self, index: usize) -> Option<Cow<'_, str>>;
    fn row_identifier(&self, index: usize) -> Option<FormulaId>;
    fn set_row_visible(&mut self, index: usize, visible: bool);
}

/// The two writable regions of the detail modal.
pub trait ModalSurface {
    fn set_title(&mut self, title: &str);
    fn set_body(&mut self, body: &str);
}
