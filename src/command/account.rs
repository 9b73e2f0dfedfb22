// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;

use crate::{
    error::{Error, Result},
    page::{account::Submission, Phase, State},
};

use super::{print_table, AccountPage, Context};

async fn open(context: &Context) -> Result<Option<AccountPage>> {
    let mut page = context.account_page();
    let mut state = page.mount().await?;
    if state == State::Loading(Phase::Initial) {
        warn!("Retrying profile load");
        state = page.reload().await?;
    }
    Ok(match state {
        State::Ready => Some(page),
        State::Loading(_) => {
            eprintln!("Your profile could not be loaded. Try again later.");
            return Err(Error::Command);
        }
        State::Idle | State::Redirecting | State::RedirectingToOnboarding => None,
    })
}

fn report(page: &AccountPage, submission: &Submission) -> Result<()> {
    if let Some(message) = page.status_message() {
        println!("{message}");
    }
    page.unmount();

    match submission {
        Submission::Saved(profile) => {
            print_table([profile]);
            Ok(())
        }
        Submission::Rejected(_) | Submission::Failed | Submission::Discarded => {
            Err(Error::Command)
        }
    }
}

/// Show your profile.
#[derive(Debug, Parser)]
pub(crate) struct Show;

#[async_trait]
impl super::Command for Show {
    async fn execute(self, context: &Context) -> Result<()> {
        if let Some(page) = open(context).await? {
            if let Some(email) = page.email() {
                println!("Email: {email}");
            }
            print_table([page.form()]);
            page.unmount();
        }
        Ok(())
    }
}

/// Change your name or avatar.
#[derive(Debug, Parser)]
pub(crate) struct Update {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    /// A reference to an already uploaded avatar image.
    #[arg(long)]
    avatar_url: Option<String>,
}

#[async_trait]
impl super::Command for Update {
    async fn execute(self, context: &Context) -> Result<()> {
        let Some(mut page) = open(context).await? else {
            return Err(Error::Command);
        };

        if let Some(first_name) = &self.first_name {
            page.set_first_name(first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            page.set_last_name(last_name)?;
        }
        if let Some(avatar_url) = &self.avatar_url {
            page.set_avatar_url(avatar_url)?;
        }

        let submission = page.submit().await?;
        report(&page, &submission)
    }
}

/// Use a newly uploaded avatar.
#[derive(Debug, Parser)]
pub(crate) struct UploadAvatar {
    /// A reference to the uploaded image.
    url: String,
}

#[async_trait]
impl super::Command for UploadAvatar {
    async fn execute(self, context: &Context) -> Result<()> {
        let Some(mut page) = open(context).await? else {
            return Err(Error::Command);
        };

        let submission = page.upload_avatar(&self.url).await?;
        report(&page, &submission)
    }
}
