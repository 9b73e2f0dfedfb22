// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod local;
mod mailer;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::{
    error::Result,
    session::{Session, Status},
};

pub(crate) use local::{Data, Local};
pub(crate) use mailer::{Mailer, Terminal as TerminalMailer};

#[async_trait]
pub(crate) trait IdentityClient: Send + Sync {
    /// Sends a one-time sign-in link to `email`.
    async fn request_magic_link(&self, email: &str) -> Result<()>;

    async fn current_session(&self) -> Result<Session>;

    /// Observes the session. The receiver sees [`Status::Pending`] until the
    /// client has determined whether anyone is signed in, then every change.
    fn subscribe(&self) -> watch::Receiver<Status>;
}

#[async_trait]
impl<T: IdentityClient + ?Sized> IdentityClient for std::sync::Arc<T> {
    async fn request_magic_link(&self, email: &str) -> Result<()> {
        (**self).request_magic_link(email).await
    }

    async fn current_session(&self) -> Result<Session> {
        (**self).current_session().await
    }

    fn subscribe(&self) -> watch::Receiver<Status> {
        (**self).subscribe()
    }
}
