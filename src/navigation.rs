// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    SignIn,
    Account,
    GetStarted,
}

impl Route {
    pub(crate) const fn path(self) -> &'static str {
        match self {
            Self::SignIn => "/auth",
            Self::Account => "/account",
            Self::GetStarted => "/getStarted",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub(crate) trait Navigator: Send + Sync {
    fn redirect_to(&self, route: Route);
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn redirect_to(&self, route: Route) {
        (**self).redirect_to(route);
    }
}

/// Navigation for the command line, where a redirect becomes a hint about
/// which command to run next.
pub(crate) struct Terminal;

impl Navigator for Terminal {
    fn redirect_to(&self, route: Route) {
        info!("Redirecting to {}", route);
        let hint = match route {
            Route::SignIn => "You are not signed in. Run `sign-in --email <EMAIL>` first.",
            Route::Account => "You are already signed in. Run `account` to see your profile.",
            Route::GetStarted => {
                "You don't have a profile yet. Run `get-started --first-name <FIRST> --last-name <LAST>`."
            }
        };
        eprintln!("{hint}");
    }
}
