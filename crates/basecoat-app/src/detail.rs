// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FormulaId, ModalSurface, RowSurface};

pub const MODAL_TITLE_PREFIX: &str = "Formula UID: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub request_id: u64,
    pub identifier: FormulaId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied,
    Failed,
    Stale,
}

/// Populates the modal for the most recently activated row. Each fetch is
/// tagged; a completion only lands if its tag is still the current target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailLoader {
    next_request_id: u64,
    current: Option<DetailRequest>,
}

impl DetailLoader {
    pub fn current(&self) -> Option<&DetailRequest> {
        self.current.as_ref()
    }

    /// Returns the request to issue, or `None` when the row carries no usable
    /// identifier. In that case the modal is left untouched.
    pub fn on_row_activated<R, M>(
        &mut self,
        rows: &R,
        index: usize,
        modal: &mut M,
    ) -> Option<DetailRequest>
    where
        R: RowSurface + ?Sized,
        M: ModalSurface + ?Sized,
    {
        let Some(identifier) = rows.row_identifier(index) else {
            tracing::debug!(index, "activated row has no formula id");
            return None;
        };
        Some(self.populate_modal(identifier, modal))
    }

    pub fn populate_modal<M>(&mut self, identifier: FormulaId, modal: &mut M) -> DetailRequest
    where
        M: ModalSurface + ?Sized,
    {
        modal.set_title(&modal_title(&identifier));
        modal.set_body(&loading_body(&identifier));

        let request = DetailRequest {
            request_id: self.next_request_id(),
            identifier,
        };
        tracing::info!(
            request_id = request.request_id,
            formula = %request.identifier,
            "loading formula detail"
        );
        self.current = Some(request.clone());
        request
    }

    pub fn complete<M>(
        &mut self,
        request: &DetailRequest,
        result: Result<String, String>,
        modal: &mut M,
    ) -> DetailOutcome
    where
        M: ModalSurface + ?Sized,
    {
        if self.current.as_ref() != Some(request) {
            tracing::debug!(
                request_id = request.request_id,
                formula = %request.identifier,
                "discarding superseded formula detail"
            );
            return DetailOutcome::Stale;
        }
        self.current = None;

        match result {
            Ok(body) => {
                modal.set_body(&body);
                DetailOutcome::Applied
            }
            Err(error) => {
                tracing::warn!(
                    request_id = request.request_id,
                    formula = %request.identifier,
                    %error,
                    "formula detail failed"
                );
                modal.set_body(&failure_body(&request.identifier, &error));
                DetailOutcome::Failed
            }
        }
    }

    /// Drops the current target so late completions are discarded.
    pub fn reset(&mut self) {
        self.current = None;
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        self.next_request_id
    }
}

pub fn modal_title(identifier: &FormulaId) -> String {
    format!("{MODAL_TITLE_PREFIX}{identifier}")
}

pub fn loading_body(identifier: &FormulaId) -> String {
    format!("Loading formula {identifier}…")
}

pub fn failure_body(identifier: &FormulaId, reason: &str) -> String {
    format!("Failed to load formula {identifier}: {reason}")
}

#[cfg(test)]
mod tests {
    use super::{DetailLoader, DetailOutcome, failure_body, loading_body, modal_title};
    use crate::{FormulaCatalog, FormulaId, FormulaRow, Listing, ModalState};

    fn listing() -> Listing {
        Listing::new(FormulaCatalog {
            columns: vec!["name".to_owned()],
            rows: vec![
                FormulaRow::new(FormulaId::parse("A"), ["Alabaster"]),
                FormulaRow::new(FormulaId::parse("B"), ["Bone"]),
                FormulaRow::new(None, ["Loose sample"]),
            ],
        })
    }

    #[test]
    fn activation_sets_title_and_loading_body() {
        let rows = listing();
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();

        let request = loader
            .on_row_activated(&rows, 0, &mut modal)
            .expect("row with id should issue a request");
        let id = FormulaId::parse("A").expect("valid id");
        assert_eq!(request.identifier, id);
        assert_eq!(modal.title, "Formula UID: A");
        assert_eq!(modal.body, loading_body(&id));
    }

    #[test]
    fn completion_replaces_body_verbatim() {
        let rows = listing();
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();
        let request = loader
            .on_row_activated(&rows, 1, &mut modal)
            .expect("request");

        let outcome = loader.complete(&request, Ok("<p>Bone <b>1:4</b></p>".to_owned()), &mut modal);
        assert_eq!(outcome, DetailOutcome::Applied);
        assert_eq!(modal.body, "<p>Bone <b>1:4</b></p>");
        assert_eq!(loader.current(), None);
    }

    #[test]
    fn later_activation_wins_regardless_of_completion_order() {
        let rows = listing();
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();

        let first = loader.on_row_activated(&rows, 0, &mut modal).expect("A");
        let second = loader.on_row_activated(&rows, 1, &mut modal).expect("B");

        let fast = loader.complete(&second, Ok("B body".to_owned()), &mut modal);
        let slow = loader.complete(&first, Ok("A body".to_owned()), &mut modal);

        assert_eq!(fast, DetailOutcome::Applied);
        assert_eq!(slow, DetailOutcome::Stale);
        assert_eq!(modal.title, "Formula UID: B");
        assert_eq!(modal.body, "B body");
    }

    #[test]
    fn reactivating_the_same_row_discards_the_older_fetch() {
        let rows = listing();
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();

        let first = loader.on_row_activated(&rows, 0, &mut modal).expect("A");
        let second = loader.on_row_activated(&rows, 0, &mut modal).expect("A again");
        assert_ne!(first.request_id, second.request_id);

        assert_eq!(
            loader.complete(&first, Ok("old".to_owned()), &mut modal),
            DetailOutcome::Stale
        );
        assert_eq!(modal.body, loading_body(&second.identifier));
    }

    #[test]
    fn row_without_identifier_is_a_no_op() {
        let rows = listing();
        let mut modal = ModalState {
            title: "Formula UID: A".to_owned(),
            body: "A body".to_owned(),
        };
        let mut loader = DetailLoader::default();

        assert_eq!(loader.on_row_activated(&rows, 2, &mut modal), None);
        assert_eq!(loader.on_row_activated(&rows, 40, &mut modal), None);
        assert_eq!(modal.title, "Formula UID: A");
        assert_eq!(modal.body, "A body");
        assert_eq!(loader.current(), None);
    }

    #[test]
    fn failure_is_rendered_into_the_body() {
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();
        let id = FormulaId::from(9_i64);
        let request = loader.populate_modal(id.clone(), &mut modal);

        let outcome = loader.complete(&request, Err("server error (500)".to_owned()), &mut modal);
        assert_eq!(outcome, DetailOutcome::Failed);
        assert_eq!(modal.title, modal_title(&id));
        assert_eq!(modal.body, failure_body(&id, "server error (500)"));
        assert!(modal.body.contains("Failed to load formula 9"));
    }

    #[test]
    fn reset_turns_in_flight_fetches_stale() {
        let mut modal = ModalState::default();
        let mut loader = DetailLoader::default();
        let request = loader.populate_modal(FormulaId::from(4_i64), &mut modal);
        loader.reset();

        assert_eq!(
            loader.complete(&request, Ok("late".to_owned()), &mut modal),
            DetailOutcome::Stale
        );
        assert_ne!(modal.body, "late");
    }
}
