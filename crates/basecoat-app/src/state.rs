// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalVisibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub modal: ModalVisibility,
    pub help_visible: bool,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            modal: ModalVisibility::Hidden,
            help_visible: false,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    FocusSearch,
    ExitToNav,
    OpenModal,
    CloseModal,
    ToggleHelp,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ModalVisibilityChanged(ModalVisibility),
    HelpVisibilityChanged(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::FocusSearch => {
                self.mode = AppMode::Search;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::OpenModal => {
                self.modal = ModalVisibility::Visible;
                vec![AppEvent::ModalVisibilityChanged(self.modal)]
            }
            AppCommand::CloseModal => {
                self.modal = ModalVisibility::Hidden;
                vec![AppEvent::ModalVisibilityChanged(self.modal)]
            }
            AppCommand::ToggleHelp => {
                self.help_visible = !self.help_visible;
                vec![AppEvent::HelpVisibilityChanged(self.help_visible)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn modal_visible(&self) -> bool {
        self.modal == ModalVisibility::Visible
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
