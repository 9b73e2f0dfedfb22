// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod account;
pub(crate) mod sign_in;

use log::debug;
use tokio::{select, sync::watch};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Internal, Result},
    guard::{self, Decision, Policy},
    navigation::Navigator,
    session::Status,
};

pub(crate) use account::Account;
pub(crate) use sign_in::SignIn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Initial,
    Submission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Idle,
    /// The guard turned the visitor away; only a placeholder is shown.
    Redirecting,
    Loading(Phase),
    Ready,
    RedirectingToOnboarding,
}

impl State {
    pub(crate) const fn is_loading(self) -> bool {
        matches!(self, Self::Loading(_))
    }
}

enum Admission {
    Allowed(Status),
    Redirected,
    Unmounted,
}

/// Runs the guard until it settles. A pending session keeps the page on its
/// placeholder until the identity client resolves it.
async fn admit<N: Navigator>(
    session: &mut watch::Receiver<Status>,
    policy: Policy,
    navigator: &N,
    lifetime: &CancellationToken,
) -> Result<Admission> {
    loop {
        let status = session.borrow_and_update().clone();
        match guard::evaluate(&status, policy) {
            Decision::Allow => return Ok(Admission::Allowed(status)),
            Decision::Redirecting { to: Some(route) } => {
                navigator.redirect_to(route);
                return Ok(Admission::Redirected);
            }
            Decision::Redirecting { to: None } => {
                debug!("Session is still pending; waiting before rendering");
                select! {
                    biased;
                    () = lifetime.cancelled() => return Ok(Admission::Unmounted),
                    changed = session.changed() => changed.map_err(Internal::from)?,
                }
            }
        }
    }
}
