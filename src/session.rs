// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated party behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Identity {
    pub(crate) id: Uuid,
    pub(crate) email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Session {
    Present(Identity),
    Absent,
}

impl Session {
    pub(crate) const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Present(identity) => Some(identity),
            Self::Absent => None,
        }
    }
}

/// What a page observes about the session. Retrieval may still be running when
/// a page mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Status {
    Pending,
    Resolved(Session),
}

impl Status {
    pub(crate) const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(session) => session.identity(),
            Self::Pending => None,
        }
    }
}

impl From<Session> for Status {
    fn from(value: Session) -> Self {
        Self::Resolved(value)
    }
}
