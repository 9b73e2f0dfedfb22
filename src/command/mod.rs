// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    config::Config,
    error::Result,
    identity::{self, TerminalMailer},
    navigation, page, profile, storage,
};

pub(crate) mod account;
pub(crate) mod get_started;
pub(crate) mod redeem;
pub(crate) mod sign_in;
pub(crate) mod sign_out;

pub(crate) type IdentityProvider =
    identity::Local<Box<dyn storage::Storage<identity::Data>>, TerminalMailer>;
pub(crate) type Profiles = profile::Stored<Box<dyn storage::Storage<profile::Table>>>;
pub(crate) type AccountPage =
    page::Account<Arc<IdentityProvider>, Arc<Profiles>, navigation::Terminal>;

pub(crate) struct Context {
    pub(crate) identity: Arc<IdentityProvider>,
    pub(crate) profiles: Arc<Profiles>,
    pub(crate) config: Config,
}

impl Context {
    pub(crate) fn account_page(&self) -> AccountPage {
        page::Account::new(
            Arc::clone(&self.identity),
            Arc::clone(&self.profiles),
            navigation::Terminal,
            self.config.notifications.clone(),
        )
    }
}

pub(crate) fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, context: &Context) -> Result<()>;
}
