// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;
use tokio::sync::watch;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("{0}")]
    Validation(#[from] Validation),
    #[error("magic link error: {0}")]
    MagicLink(#[from] MagicLink),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("you need to sign in first")]
    NotSignedIn,
    #[error("the form is disabled while the page is loading")]
    InputsDisabled,
    #[error("command execution failed")]
    Command,
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

/// Problems with user input. The display text of each variant is shown to the
/// user as-is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Validation {
    #[error("Please fill in your first name")]
    FirstNameMissing,
    #[error("Please fill in your last name")]
    LastNameMissing,
    #[error("Please provide a valid email address")]
    EmailMissing,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum MagicLink {
    #[error("no base URL is configured for sign-in links")]
    NoBaseUrl,
    #[error("link does not carry a sign-in token")]
    MissingToken,
    #[error("link is unknown or has already been used")]
    Unknown,
    #[error("link expired")]
    Expired,
}

#[derive(Error, Debug)]
pub(crate) enum Internal {
    #[error("channel is closed")]
    ChannelClosed,
}

impl From<watch::error::RecvError> for Internal {
    fn from(_: watch::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}
