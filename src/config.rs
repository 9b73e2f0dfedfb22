// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, path::Path, time::Duration};

use chrono::Duration as Lifetime;
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::Result, metadata};

static DEFAULT_LINK_BASE: Lazy<Option<Url>> =
    Lazy::new(|| Url::parse("http://localhost:3000/account").ok());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct Notifications {
    pub(crate) validation_secs: f64,
    pub(crate) update_secs: f64,
    pub(crate) sign_in_error_secs: f64,
}

impl Notifications {
    pub(crate) fn validation(&self) -> Duration {
        seconds(self.validation_secs)
    }

    pub(crate) fn update(&self) -> Duration {
        seconds(self.update_secs)
    }

    pub(crate) fn sign_in_error(&self) -> Duration {
        seconds(self.sign_in_error_secs)
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            validation_secs: 1.5,
            update_secs: 1.5,
            sign_in_error_secs: 1.25,
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct MagicLinks {
    /// Page the emailed link points at; the sign-in token is appended as a
    /// query parameter.
    pub(crate) base_url: Option<Url>,
    pub(crate) link_lifetime_secs: i64,
    pub(crate) session_lifetime_secs: i64,
}

impl MagicLinks {
    pub(crate) fn link_lifetime(&self) -> Lifetime {
        Lifetime::try_seconds(self.link_lifetime_secs).unwrap_or_else(Lifetime::zero)
    }

    pub(crate) fn session_lifetime(&self) -> Lifetime {
        Lifetime::try_seconds(self.session_lifetime_secs).unwrap_or_else(Lifetime::zero)
    }
}

impl Default for MagicLinks {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LINK_BASE.clone(),
            link_lifetime_secs: 60 * 60,
            session_lifetime_secs: 7 * 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct Config {
    pub(crate) notifications: Notifications,
    pub(crate) magic_links: MagicLinks,
}

impl Config {
    /// Reads the configuration at `path`, or from the project configuration
    /// directory when no path is given. A missing file yields the defaults.
    pub(crate) async fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = metadata::PROJECT_DIRS
            .as_ref()
            .map(|dirs| dirs.config_dir().join("config.json"));
        let Some(path) = path.or(default_path.as_deref()) else {
            return Ok(Self::default());
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!("Loading configuration from {}", path.display());
                Ok(serde_json::from_slice(&bytes)?)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
