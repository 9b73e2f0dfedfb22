// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::lock::Mutex;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

use crate::{
    config,
    error::{self, Result, Validation},
    profile,
    session::{Identity, Session, Status},
    storage,
};

use super::{IdentityClient, Mailer};

const TOKEN_PARAMETER: &str = "token";

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PendingLink {
    email: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredSession {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

/// Everything the local identity provider persists. Links are keyed by the
/// digest of their token; the token itself only ever leaves in the link.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Data {
    accounts: BTreeMap<String, Uuid>,
    links: BTreeMap<String, PendingLink>,
    session: Option<StoredSession>,
}

impl Data {
    fn prune(&mut self, now: DateTime<Utc>) {
        self.links.retain(|_, link| link.expires_at > now);
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.expires_at <= now)
        {
            debug!("Stored session expired");
            self.session = None;
        }
    }

    fn current(&self) -> Session {
        self.session
            .as_ref()
            .map_or(Session::Absent, |stored| {
                Session::Present(stored.identity.clone())
            })
    }
}

fn digest(token: &str) -> String {
    base64::encode_config(Sha256::digest(token.as_bytes()), base64::URL_SAFE_NO_PAD)
}

/// Identity provider that issues and redeems magic links itself, keeping its
/// state in a [`storage::Storage`].
pub(crate) struct Local<Storage: storage::Storage<Data>, M: Mailer> {
    storage: Arc<Mutex<Storage>>,
    mailer: M,
    config: config::MagicLinks,
    status: watch::Sender<Status>,
}

impl<Storage: storage::Storage<Data>, M: Mailer> Local<Storage, M> {
    pub(crate) fn new(storage: Arc<Mutex<Storage>>, mailer: M, config: config::MagicLinks) -> Self {
        let (status, _) = watch::channel(Status::Pending);
        Self {
            storage,
            mailer,
            config,
            status,
        }
    }

    /// Reads the stored session and resolves the observed status.
    pub(crate) async fn restore(&self) -> Result<Session> {
        self.current_session().await
    }

    pub(crate) async fn redeem(&self, link: &Url) -> Result<Identity> {
        let token = link
            .query_pairs()
            .find(|(key, _)| key == TOKEN_PARAMETER)
            .map(|(_, value)| value.into_owned())
            .ok_or(error::MagicLink::MissingToken)?;

        let now = Utc::now();
        let mut storage = self.storage.lock().await;
        let mut data = storage.get().await?.unwrap_or_default();

        // Links are single use, so consume it before checking anything else.
        let pending = data
            .links
            .remove(&digest(&token))
            .ok_or(error::MagicLink::Unknown)?;
        if pending.expires_at <= now {
            data.prune(now);
            storage.update(&data).await?;
            return Err(error::MagicLink::Expired.into());
        }

        let id = *data
            .accounts
            .entry(pending.email.clone())
            .or_insert_with(Uuid::new_v4);
        let identity = Identity {
            id,
            email: pending.email,
        };
        data.prune(now);
        data.session = Some(StoredSession {
            identity: identity.clone(),
            expires_at: now + self.config.session_lifetime(),
        });
        storage.update(&data).await?;
        drop(storage);

        info!("Signed in as {}", identity.email);
        self.publish(Session::Present(identity.clone()));
        Ok(identity)
    }

    pub(crate) async fn sign_out(&self) -> Result<()> {
        let mut storage = self.storage.lock().await;
        if let Some(mut data) = storage.get().await? {
            data.session = None;
            storage.update(&data).await?;
        }
        drop(storage);

        info!("Signed out");
        self.publish(Session::Absent);
        Ok(())
    }

    fn publish(&self, session: Session) {
        let status = Status::Resolved(session);
        _ = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

#[async_trait]
impl<Storage: storage::Storage<Data>, M: Mailer> IdentityClient for Local<Storage, M> {
    async fn request_magic_link(&self, email: &str) -> Result<()> {
        // Addresses are case-insensitive; one account per lowercased address.
        let email = profile::remove_whitespace(email).to_lowercase();
        if profile::is_blank(&email) || !email.contains('@') {
            return Err(Validation::EmailMissing.into());
        }

        let mut link = self
            .config
            .base_url
            .clone()
            .ok_or(error::MagicLink::NoBaseUrl)?;
        let token = base64::encode_config(rand::random::<[u8; 32]>(), base64::URL_SAFE_NO_PAD);
        _ = link
            .query_pairs_mut()
            .append_pair(TOKEN_PARAMETER, &token);

        let now = Utc::now();
        {
            let mut storage = self.storage.lock().await;
            let mut data = storage.get().await?.unwrap_or_default();
            data.prune(now);
            _ = data.links.insert(
                digest(&token),
                PendingLink {
                    email: email.clone(),
                    expires_at: now + self.config.link_lifetime(),
                },
            );
            storage.update(&data).await?;
        }

        debug!("Issued sign-in link for {}", email);
        self.mailer.deliver(&email, &link).await
    }

    async fn current_session(&self) -> Result<Session> {
        let mut storage = self.storage.lock().await;
        let session = match storage.get().await? {
            Some(mut data) => {
                let had_session = data.session.is_some();
                data.prune(Utc::now());
                if had_session && data.session.is_none() {
                    storage.update(&data).await?;
                }
                data.current()
            }
            None => Session::Absent,
        };
        drop(storage);

        self.publish(session.clone());
        Ok(session)
    }

    fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }
}
