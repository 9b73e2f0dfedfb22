// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::error::{Result, Validation};

pub(crate) use store::{Stored, Table};

/// The persisted account record. `id` is always the owning identity's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[serde(deny_unknown_fields)]
pub(crate) struct Profile {
    #[tabled(rename = "ID")]
    pub(crate) id: Uuid,
    #[tabled(rename = "First Name")]
    pub(crate) first_name: String,
    #[tabled(rename = "Last Name")]
    pub(crate) last_name: String,
    #[tabled(rename = "Avatar")]
    pub(crate) avatar_url: String,
    #[tabled(rename = "Updated")]
    pub(crate) updated_at: DateTime<Utc>,
}

/// Values taken from the account form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Tabled)]
pub(crate) struct Draft {
    #[tabled(rename = "First Name")]
    pub(crate) first_name: String,
    #[tabled(rename = "Last Name")]
    pub(crate) last_name: String,
    #[tabled(rename = "Avatar")]
    pub(crate) avatar_url: String,
}

impl Draft {
    /// Checks the first name before the last name and stops at the first
    /// problem.
    pub(crate) fn validate(&self) -> Result<(), Validation> {
        if is_blank(&self.first_name) {
            Err(Validation::FirstNameMissing)
        } else if is_blank(&self.last_name) {
            Err(Validation::LastNameMissing)
        } else {
            Ok(())
        }
    }

    pub(crate) fn into_profile(self, id: Uuid, updated_at: DateTime<Utc>) -> Profile {
        Profile {
            id,
            first_name: capitalize_first(&remove_whitespace(&self.first_name)),
            last_name: capitalize_first(&remove_whitespace(&self.last_name)),
            avatar_url: self.avatar_url,
            updated_at,
        }
    }
}

impl From<&Profile> for Draft {
    fn from(value: &Profile) -> Self {
        Self {
            first_name: remove_whitespace(&value.first_name),
            last_name: remove_whitespace(&value.last_name),
            avatar_url: value.avatar_url.clone(),
        }
    }
}

pub(crate) fn remove_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}

/// Upper-cases the first character and leaves the rest alone.
pub(crate) fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[async_trait]
pub(crate) trait ProfileStore: Send + Sync {
    /// `Ok(None)` means the identity has not been onboarded yet.
    async fn get(&self, id: Uuid) -> Result<Option<Profile>>;
    /// Replaces every stored field of the record with `profile.id`.
    async fn put(&self, profile: &Profile) -> Result<()>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for std::sync::Arc<T> {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>> {
        (**self).get(id).await
    }

    async fn put(&self, profile: &Profile) -> Result<()> {
        (**self).put(profile).await
    }
}
