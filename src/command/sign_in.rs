// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;

use crate::{
    error::{Error, Result},
    navigation,
    page::{self, State},
};

use super::Context;

/// Send a sign-in link to your email address.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The address to send the link to.
    #[arg(long)]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, context: &Context) -> Result<()> {
        let mut page = page::SignIn::new(
            Arc::clone(&context.identity),
            navigation::Terminal,
            context.config.notifications.clone(),
        );
        let _ = page.mount().await?;
        if page.state() != State::Ready {
            return Ok(());
        }

        page.set_email(&self.email);
        let sent = page.submit().await?;
        if let Some(message) = page.status_message() {
            println!("{message}");
        }
        page.unmount();

        if sent {
            Ok(())
        } else {
            Err(Error::Command)
        }
    }
}
