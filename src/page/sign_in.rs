// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::error;
use tokio::{select, sync::watch};
use tokio_util::sync::CancellationToken;

use crate::{
    config,
    error::{Error, Result, Validation},
    guard::Policy,
    identity::IdentityClient,
    navigation::Navigator,
    notifier::Notifier,
    profile,
    session::Status,
};

use super::{admit, Admission, Phase, State};

pub(crate) const CHECK_EMAIL: &str = "Check your email for the login link!";

/// The sign-in page, only reachable without a session.
pub(crate) struct SignIn<I: IdentityClient, N: Navigator> {
    identity: I,
    navigator: N,
    notifications: config::Notifications,
    session: watch::Receiver<Status>,
    lifetime: CancellationToken,
    state: State,
    email: String,
    notifier: Notifier,
}

impl<I: IdentityClient, N: Navigator> SignIn<I, N> {
    pub(crate) fn new(identity: I, navigator: N, notifications: config::Notifications) -> Self {
        let session = identity.subscribe();
        Self {
            identity,
            navigator,
            notifications,
            session,
            lifetime: CancellationToken::new(),
            state: State::Idle,
            email: String::new(),
            notifier: Notifier::new(),
        }
    }

    pub(crate) async fn mount(&mut self) -> Result<State> {
        self.state = State::Redirecting;
        match admit(
            &mut self.session,
            Policy::RequiresNoAuth,
            &self.navigator,
            &self.lifetime,
        )
        .await?
        {
            Admission::Allowed(_) => self.state = State::Ready,
            Admission::Redirected | Admission::Unmounted => {}
        }
        Ok(self.state)
    }

    pub(crate) fn set_email(&mut self, email: &str) {
        self.email = profile::remove_whitespace(email);
    }

    /// Requests a link for the entered address. Returns whether the request
    /// went through.
    pub(crate) async fn submit(&mut self) -> Result<bool> {
        if self.state != State::Ready {
            return Err(Error::InputsDisabled);
        }

        self.state = State::Loading(Phase::Submission);
        let result = select! {
            biased;
            () = self.lifetime.cancelled() => return Ok(false),
            result = self.identity.request_magic_link(&self.email) => result,
        };
        self.state = State::Ready;

        match result {
            Ok(()) => {
                self.notifier.hold(CHECK_EMAIL);
                Ok(true)
            }
            Err(err) => {
                if profile::is_blank(&self.email)
                    || matches!(err, Error::Validation(Validation::EmailMissing))
                {
                    self.notifier.show(
                        &Validation::EmailMissing.to_string(),
                        self.notifications.sign_in_error(),
                    );
                }
                error!("Could not request a sign-in link: {}", err);
                Ok(false)
            }
        }
    }

    pub(crate) fn unmount(&self) {
        self.lifetime.cancel();
    }

    pub(crate) const fn state(&self) -> State {
        self.state
    }

    pub(crate) fn status_message(&self) -> Option<String> {
        if self.state.is_loading() {
            None
        } else {
            self.notifier.current()
        }
    }
}
