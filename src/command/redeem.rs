// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use url::Url;

use crate::error::Result;

use super::Context;

/// Sign in with a link you received by email.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The full link from the email.
    #[arg(value_parser = Url::parse)]
    link: Url,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, context: &Context) -> Result<()> {
        let identity = context.identity.redeem(&self.link).await?;
        println!("Signed in as {}", identity.email);
        Ok(())
    }
}
