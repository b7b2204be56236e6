// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use basecoat_app::{
    FormulaCatalog, FormulaId, FormulaRow, ModalSurface, RowSurface, loading_body,
};
use std::borrow::Cow;
use std::collections::BTreeMap;

const COLUMNS: [&str; 5] = ["name", "manufacturer", "base", "sheen", "colorants"];

const COLOR_ADJECTIVES: [&str; 14] = [
    "Harbor", "Linen", "Misty", "Copper", "Sage", "Drift", "Chalk", "Ember", "Quarry", "Meadow",
    "Slate", "Dune", "Fjord", "Saffron",
];
const COLOR_NOUNS: [&str; 12] = [
    "Gray", "White", "Blue", "Clay", "Green", "Wood", "Rose", "Stone", "Sand", "Smoke", "Moss",
    "Cream",
];
const MANUFACTURERS: [&str; 6] = [
    "Benjamin Moore",
    "Sherwin-Williams",
    "Behr",
    "Valspar",
    "Farrow & Ball",
    "PPG",
];
const BASES: [&str; 4] = ["latex", "oil", "acrylic", "alkyd"];
const SHEENS: [&str; 5] = ["flat", "matte", "eggshell", "satin", "semi-gloss"];
const COLORANTS: [&str; 9] = ["B", "C", "D", "E", "F", "KX", "L", "R", "V"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible paint formulas for demos and tests.
#[derive(Debug, Clone)]
pub struct FormulaFaker {
    rng: DeterministicRng,
}

impl FormulaFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn row(&mut self, id: i64) -> FormulaRow {
        let name = format!("{} {}", self.pick(&COLOR_ADJECTIVES), self.pick(&COLOR_NOUNS));
        let manufacturer = self.pick(&MANUFACTURERS);
        let base = self.pick(&BASES);
        let sheen = self.pick(&SHEENS);
        let colorants = self.colorants();
        FormulaRow::new(
            Some(FormulaId::from(id)),
            [name, manufacturer.to_owned(), base.to_owned(), sheen.to_owned(), colorants],
        )
    }

    pub fn catalog(&mut self, count: usize) -> FormulaCatalog {
        let rows = (1..=count)
            .map(|id| self.row(id as i64))
            .collect::<Vec<_>>();
        FormulaCatalog {
            columns: COLUMNS.iter().map(|column| (*column).to_owned()).collect(),
            rows,
        }
    }

    fn colorants(&mut self) -> String {
        let count = 1 + self.rng.int_n(3);
        (0..count)
            .map(|_| {
                let code = self.pick(&COLORANTS);
                let ounces = 1 + self.rng.int_n(48);
                format!("{code} {ounces}Y")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

/// In-memory stand-in for the formula server: a listing plus one rendered
/// detail fragment per identified row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoCatalog {
    catalog: FormulaCatalog,
    details: BTreeMap<FormulaId, String>,
}

impl DemoCatalog {
    pub fn seeded(seed: u64, count: usize) -> Self {
        let mut catalog = FormulaFaker::new(seed).catalog(count);
        catalog.rows.push(FormulaRow::new(
            None,
            ["Unfiled swatch", "", "", "", ""],
        ));
        Self::from_catalog(catalog)
    }

    pub fn from_catalog(catalog: FormulaCatalog) -> Self {
        let details = catalog
            .rows
            .iter()
            .filter_map(|row| {
                let id = row.id.clone()?;
                let body = render_detail(&catalog.columns, row);
                Some((id, body))
            })
            .collect();
        Self { catalog, details }
    }

    pub fn catalog(&self) -> &FormulaCatalog {
        &self.catalog
    }

    pub fn detail(&self, identifier: &FormulaId) -> Result<String> {
        match self.details.get(identifier) {
            Some(body) => Ok(body.clone()),
            None => bail!("server error (404): formula {identifier} not found"),
        }
    }
}

/// Rows built from bare text, numbered from 1, as in the listing scenarios.
pub fn catalog_from_texts(texts: &[&str]) -> FormulaCatalog {
    FormulaCatalog {
        columns: vec!["formula".to_owned()],
        rows: texts
            .iter()
            .enumerate()
            .map(|(index, text)| FormulaRow::new(Some(FormulaId::from(index as i64 + 1)), [*text]))
            .collect(),
    }
}

fn render_detail(columns: &[String], row: &FormulaRow) -> String {
    let mut out = String::from("<dl class=\"formula\">\n");
    for (index, cell) in row.cells.iter().enumerate() {
        let label = columns.get(index).map(String::as_str).unwrap_or("field");
        out.push_str(&format!("  <dt>{label}</dt><dd>{cell}</dd>\n"));
    }
    out.push_str("</dl>\n");
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOp {
    Show(usize),
    Hide(usize),
}

/// Row surface that records every visibility write in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingRows {
    rows: Vec<FormulaRow>,
    pub visible: Vec<bool>,
    pub ops: Vec<RowOp>,
}

impl RecordingRows {
    pub fn new(catalog: FormulaCatalog) -> Self {
        let visible = vec![true; catalog.rows.len()];
        Self {
            rows: catalog.rows,
            visible,
            ops: Vec::new(),
        }
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(index, visible)| visible.then_some(index))
            .collect()
    }
}

impl RowSurface for RecordingRows {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.rows.get(index).map(|row| Cow::Owned(row.text()))
    }

    fn row_identifier(&self, index: usize) -> Option<FormulaId> {
        self.rows.get(index).and_then(|row| row.id.clone())
    }

    fn set_row_visible(&mut self, index: usize, visible: bool) {
        if let Some(slot) = self.visible.get_mut(index) {
            *slot = visible;
        }
        self.ops.push(if visible {
            RowOp::Show(index)
        } else {
            RowOp::Hide(index)
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalWrite {
    Title(String),
    Body(String),
}

/// Modal surface that keeps the full write history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingModal {
    pub writes: Vec<ModalWrite>,
}

impl RecordingModal {
    pub fn title(&self) -> Option<&str> {
        self.writes.iter().rev().find_map(|write| match write {
            ModalWrite::Title(title) => Some(title.as_str()),
            ModalWrite::Body(_) => None,
        })
    }

    pub fn body(&self) -> Option<&str> {
        self.writes.iter().rev().find_map(|write| match write {
            ModalWrite::Body(body) => Some(body.as_str()),
            ModalWrite::Title(_) => None,
        })
    }

    pub fn is_loading(&self, identifier: &FormulaId) -> bool {
        self.body() == Some(loading_body(identifier).as_str())
    }
}

impl ModalSurface for RecordingModal {
    fn set_title(&mut self, title: &str) {
        self.writes.push(ModalWrite::Title(title.to_owned()));
    }

    fn set_body(&mut self, body: &str) {
        self.writes.push(ModalWrite::Body(body.to_owned()));
    }
}
