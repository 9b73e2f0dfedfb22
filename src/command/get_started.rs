// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use log::info;

use crate::{
    error::{Error, Result},
    identity::IdentityClient as _,
    navigation::{Navigator as _, Route, Terminal},
    profile::{Draft, ProfileStore as _},
    session::Session,
};

use super::{print_table, Context};

/// Create your profile after signing in for the first time.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long, default_value = "")]
    avatar_url: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, context: &Context) -> Result<()> {
        let Session::Present(identity) = context.identity.current_session().await? else {
            Terminal.redirect_to(Route::SignIn);
            return Err(Error::NotSignedIn);
        };

        if context.profiles.get(identity.id).await?.is_some() {
            Terminal.redirect_to(Route::Account);
            return Ok(());
        }

        let draft = Draft {
            first_name: self.first_name,
            last_name: self.last_name,
            avatar_url: self.avatar_url,
        };
        draft.validate()?;

        let profile = draft.into_profile(identity.id, Utc::now());
        context.profiles.put(&profile).await?;
        info!("Created profile for {}", identity.email);
        print_table([&profile]);
        Ok(())
    }
}
