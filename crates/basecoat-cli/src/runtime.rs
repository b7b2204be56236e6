// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use basecoat_app::{DetailRequest, FormulaCatalog, FormulaId};
use basecoat_client::Client;
use basecoat_testkit::DemoCatalog;
use basecoat_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;

const DEMO_SEED: u64 = 625;
const DEMO_ROWS: usize = 40;

/// Talks to the formula server. Detail fetches run on their own thread so
/// the UI keeps taking keystrokes while a slow fragment loads.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl basecoat_tui::AppRuntime for HttpRuntime {
    fn load_catalog(&mut self) -> Result<FormulaCatalog> {
        self.client.list_formulas()
    }

    fn fetch_formula_detail(&mut self, identifier: &FormulaId) -> Result<String> {
        self.client.fetch_formula_detail(identifier)
    }

    fn spawn_detail_fetch(
        &mut self,
        request: DetailRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("formula-detail-{}", request.request_id))
            .spawn(move || {
                let result = client
                    .fetch_formula_detail(&request.identifier)
                    .map_err(|error| format!("{error:#}"));
                if let Err(error) = &result {
                    tracing::warn!(
                        request_id = request.request_id,
                        identifier = %request.identifier,
                        %error,
                        "formula detail fetch failed"
                    );
                }
                // The receiver is gone only when the UI has exited.
                let _ = tx.send(InternalEvent::DetailLoaded { request, result });
            })
            .context("spawn detail fetch thread")?;
        Ok(())
    }
}

/// Serves a seeded catalog from memory for `--demo`.
pub struct DemoRuntime {
    demo: DemoCatalog,
}

impl DemoRuntime {
    pub fn new() -> Self {
        Self {
            demo: DemoCatalog::seeded(DEMO_SEED, DEMO_ROWS),
        }
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl basecoat_tui::AppRuntime for DemoRuntime {
    fn load_catalog(&mut self) -> Result<FormulaCatalog> {
        Ok(self.demo.catalog().clone())
    }

    fn fetch_formula_detail(&mut self, identifier: &FormulaId) -> Result<String> {
        self.demo.detail(identifier)
    }
}
