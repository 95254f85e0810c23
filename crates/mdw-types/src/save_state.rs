use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blob_id::short_blob_id;

/// Stage of a save through the storage write protocol.
///
/// `Idle -> Encoding -> Registering -> Uploading -> Certifying -> Completed`,
/// with any active stage able to move to `Error`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStage {
    #[default]
    Idle,
    Encoding,
    Registering,
    Uploading,
    Certifying,
    Completed,
    Error,
}

impl SaveStage {
    /// `Completed` or `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// A stage with a network or signing call in flight.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != Self::Idle
    }

    /// Progress percentage reported on entering the stage.
    pub fn entry_progress(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Encoding => 10,
            Self::Registering => 25,
            Self::Uploading => 50,
            Self::Certifying => 75,
            Self::Completed => 100,
            Self::Error => 0,
        }
    }

    /// Default status text for the stage.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Idle => "Ready to save",
            Self::Encoding => "Encoding file...",
            Self::Registering => "Registering blob on chain...",
            Self::Uploading => "Uploading to storage nodes...",
            Self::Certifying => "Certifying blob...",
            Self::Completed => "Saved",
            Self::Error => "Save failed",
        }
    }
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Encoding => "encoding",
            Self::Registering => "registering",
            Self::Uploading => "uploading",
            Self::Certifying => "certifying",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Snapshot of a save in progress, published for the UI.
///
/// `blob_id` is set only in `Completed` and `error` only in `Error`. The
/// constructors are the only way to build a state, which keeps that
/// invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    stage: SaveStage,
    progress: u8,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    blob_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SaveState {
    /// Nothing in flight.
    pub fn idle() -> Self {
        Self {
            stage: SaveStage::Idle,
            progress: 0,
            message: SaveStage::Idle.status_message().to_string(),
            blob_id: None,
            error: None,
        }
    }

    /// An active stage. Terminal stages must go through [`Self::completed`]
    /// or [`Self::failed`]; passing one here yields an idle state.
    pub fn active(stage: SaveStage, progress: u8, message: impl Into<String>) -> Self {
        if !stage.is_active() {
            return Self::idle();
        }
        Self {
            stage,
            progress: progress.min(100),
            message: message.into(),
            blob_id: None,
            error: None,
        }
    }

    /// Enter `stage` at its default progress and message.
    pub fn entering(stage: SaveStage) -> Self {
        Self::active(stage, stage.entry_progress(), stage.status_message())
    }

    /// Terminal success. The message shows the shortened blob id.
    pub fn completed(blob_id: impl Into<String>) -> Self {
        let blob_id = blob_id.into();
        Self {
            stage: SaveStage::Completed,
            progress: 100,
            message: format!("Saved! Blob ID: {}", short_blob_id(&blob_id)),
            blob_id: Some(blob_id),
            error: None,
        }
    }

    /// Terminal failure carrying the classified, user-facing message.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            stage: SaveStage::Error,
            progress: 0,
            message: error.clone(),
            blob_id: None,
            error: Some(error),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> SaveStage {
        self.stage
    }

    /// Percentage in `0..=100`.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Status line for display.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Saved blob id; `Some` only when completed.
    pub fn blob_id(&self) -> Option<&str> {
        self.blob_id.as_deref()
    }

    /// Failure message; `Some` only in `Error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the save has finished, either way.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

impl Default for SaveState {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holds_invariant(state: &SaveState) -> bool {
        match state.stage() {
            SaveStage::Completed => state.blob_id().is_some() && state.error().is_none(),
            SaveStage::Error => state.error().is_some() && state.blob_id().is_none(),
            _ => state.blob_id().is_none() && state.error().is_none(),
        }
    }

    #[test]
    fn every_constructor_holds_invariant() {
        let states = [
            SaveState::idle(),
            SaveState::entering(SaveStage::Encoding),
            SaveState::entering(SaveStage::Registering),
            SaveState::entering(SaveStage::Uploading),
            SaveState::entering(SaveStage::Certifying),
            SaveState::active(SaveStage::Encoding, 5, "Checking network..."),
            SaveState::active(SaveStage::Completed, 100, "sneaky"),
            SaveState::completed("0xff"),
            SaveState::failed("Save failed: boom"),
        ];
        for state in &states {
            assert!(holds_invariant(state), "{state:?}");
        }
    }

    #[test]
    fn entry_progress_increases() {
        let order = [
            SaveStage::Encoding,
            SaveStage::Registering,
            SaveStage::Uploading,
            SaveStage::Certifying,
            SaveStage::Completed,
        ];
        assert!(order.windows(2).all(|w| w[0].entry_progress() < w[1].entry_progress()));
    }

    #[test]
    fn completed_message_shortens_id() {
        let state = SaveState::completed("0123456789abcdefghijklmnop");
        assert_eq!(state.message(), "Saved! Blob ID: 01234567...ijklmnop");
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn serializes_lowercase_stage() {
        let json = serde_json::to_value(SaveState::entering(SaveStage::Uploading)).unwrap();
        assert_eq!(json["stage"], "uploading");
        assert_eq!(json["progress"], 50);
        assert!(json.get("blobId").is_none());
    }
}
