// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use futures_util::lock::Mutex;
use log::debug;
use uuid::Uuid;

use crate::{error::Result, storage};

use super::{Profile, ProfileStore};

pub(crate) type Table = BTreeMap<Uuid, Profile>;

/// Profile table kept as one document in a [`storage::Storage`]. The lock
/// serializes writers, so concurrent puts for one id apply one after another.
pub(crate) struct Stored<Storage: storage::Storage<Table>> {
    storage: Arc<Mutex<Storage>>,
}

impl<Storage: storage::Storage<Table>> Stored<Storage> {
    pub(crate) fn new(storage: Arc<Mutex<Storage>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<Storage: storage::Storage<Table>> ProfileStore for Stored<Storage> {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        let mut storage = self.storage.lock().await;
        Ok(storage
            .get()
            .await?
            .and_then(|mut table| table.remove(&id)))
    }

    async fn put(&self, profile: &Profile) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let mut table = storage.get().await?.unwrap_or_default();
        debug!("Writing profile {}", profile.id);
        _ = table.insert(profile.id, profile.clone());
        storage.update(&table).await
    }
}
