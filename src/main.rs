// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod command;
mod config;
mod error;
mod guard;
mod identity;
mod metadata;
mod navigation;
mod notifier;
mod page;
mod profile;
mod session;
mod storage;

use std::{path::PathBuf, process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use futures_util::lock::Mutex;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use storage::IsPersistent as _;
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    SignIn(command::sign_in::Command),
    Redeem(command::redeem::Command),
    SignOut(command::sign_out::Command),
    GetStarted(command::get_started::Command),
    Account(command::account::Show),
    Update(command::account::Update),
    UploadAvatar(command::account::UploadAvatar),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, context: &command::Context) -> Result<()> {
        match self {
            Self::SignIn(cmd) => cmd.execute(context).await,
            Self::Redeem(cmd) => cmd.execute(context).await,
            Self::SignOut(cmd) => cmd.execute(context).await,
            Self::GetStarted(cmd) => cmd.execute(context).await,
            Self::Account(cmd) => cmd.execute(context).await,
            Self::Update(cmd) => cmd.execute(context).await,
            Self::UploadAvatar(cmd) => cmd.execute(context).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The JSON configuration file to read. Defaults to config.json in the
    /// user's configuration directory.
    #[arg(long, env = "HALLPASS_CONFIG", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// The page that sign-in links point at.
    #[arg(long, env = "HALLPASS_LINK_BASE", value_parser = Url::parse)]
    link_base: Option<Url>,

    /// Keep sessions and profiles in memory only, forgetting them on exit.
    #[arg(long)]
    ephemeral: bool,

    #[clap(subcommand)]
    command: Command,
}

fn get_storage<T: Send + Serialize + Sync + for<'de> Deserialize<'de> + Clone + 'static>(
    args: &Args,
    file: &str,
) -> Box<dyn storage::Storage<T>> {
    if !args.ephemeral {
        if let Some(file_storage) = storage::File::new(file) {
            return Box::new(file_storage);
        }
        warn!("No data directory is available; {} will not be kept", file);
    }

    Box::new(storage::Memory::<T>::new())
}

async fn run(args: Args) -> Result<()> {
    let mut config = config::Config::load(args.config.as_deref()).await?;
    if let Some(link_base) = args.link_base.clone() {
        config.magic_links.base_url = Some(link_base);
    }
    debug!("Using configuration {:?}", config);

    let identity_storage = get_storage::<identity::Data>(&args, "identity.json");
    let profile_storage = get_storage::<profile::Table>(&args, "profiles.json");
    if !identity_storage.is_persistent() {
        debug!("Sessions will end when this process exits");
    }
    let identity = Arc::new(identity::Local::new(
        Arc::new(Mutex::new(identity_storage)),
        identity::TerminalMailer,
        config.magic_links.clone(),
    ));
    let _ = identity.restore().await?;

    let context = command::Context {
        identity,
        profiles: Arc::new(profile::Stored::new(Arc::new(Mutex::new(profile_storage)))),
        config,
    };
    command::Command::execute(args.command, &context).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("HALLPASS_LOG", "warn")
        .write_style("HALLPASS_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
