// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Delivers sign-in links to their recipients.
#[async_trait]
pub(crate) trait Mailer: Send + Sync {
    async fn deliver(&self, email: &str, link: &Url) -> Result<()>;
}

#[async_trait]
impl<T: Mailer + ?Sized> Mailer for std::sync::Arc<T> {
    async fn deliver(&self, email: &str, link: &Url) -> Result<()> {
        (**self).deliver(email, link).await
    }
}

/// Prints the link instead of sending mail, for use on a single machine.
pub(crate) struct Terminal;

#[async_trait]
impl Mailer for Terminal {
    async fn deliver(&self, email: &str, link: &Url) -> Result<()> {
        println!("Sign-in link for {email}:\n{link}");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use futures_util::lock::Mutex;
    use url::Url;

    use super::Mailer;
    use crate::error::Result;

    #[derive(Default)]
    pub(crate) struct Outbox {
        sent: Mutex<Vec<(String, Url)>>,
    }

    impl Outbox {
        pub(crate) async fn last(&self) -> Option<(String, Url)> {
            self.sent.lock().await.last().cloned()
        }
    }

    #[async_trait]
    impl Mailer for Outbox {
        async fn deliver(&self, email: &str, link: &Url) -> Result<()> {
            self.sent.lock().await.push((email.to_owned(), link.clone()));
            Ok(())
        }
    }
}
