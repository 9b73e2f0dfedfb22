// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Page eligibility based on the session.
//!
//! A decision is never stored. Pages compute it on mount and again whenever
//! the session changes, and render nothing but a placeholder while it says
//! [`Decision::Redirecting`].

use log::debug;

use crate::{
    navigation::Route,
    session::{Session, Status},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    /// Only signed-in visitors may see the page (e.g. the account page).
    RequiresAuth,
    /// Only signed-out visitors may see the page (e.g. the sign-in page).
    RequiresNoAuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Allow,
    /// The page must not show its content or fetch anything. `to` is `None`
    /// while the session is still being determined; there is nowhere to go
    /// yet, but we fail closed.
    Redirecting { to: Option<Route> },
}

pub(crate) fn evaluate(status: &Status, policy: Policy) -> Decision {
    let decision = match (status, policy) {
        (Status::Pending, _) => Decision::Redirecting { to: None },
        (Status::Resolved(Session::Absent), Policy::RequiresAuth) => Decision::Redirecting {
            to: Some(Route::SignIn),
        },
        (Status::Resolved(Session::Present(_)), Policy::RequiresNoAuth) => {
            Decision::Redirecting {
                to: Some(Route::Account),
            }
        }
        (Status::Resolved(Session::Present(_)), Policy::RequiresAuth)
        | (Status::Resolved(Session::Absent), Policy::RequiresNoAuth) => Decision::Allow,
    };
    debug!("Guard decision for {:?} under {:?}: {:?}", status, policy, decision);
    decision
}
