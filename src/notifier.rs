// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::{sync::watch, task::JoinHandle, time};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    generation: u64,
    message: String,
}

/// A single message slot that empties itself after a while.
///
/// Showing a message replaces whatever was there and restarts the expiry.
/// Each expiry only clears the message it was scheduled for, so a timer that
/// fires late can never erase its successor.
pub(crate) struct Notifier {
    slot: Arc<watch::Sender<Option<Slot>>>,
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            generation: 0,
            expiry: None,
        }
    }

    pub(crate) fn show(&mut self, message: &str, duration: Duration) {
        let generation = self.replace(message);
        let slot = Arc::clone(&self.slot);
        self.expiry = Some(tokio::spawn(async move {
            time::sleep(duration).await;
            _ = slot.send_if_modified(|current| {
                if current
                    .as_ref()
                    .is_some_and(|active| active.generation == generation)
                {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        }));
    }

    /// Shows a message that stays until another one replaces it.
    pub(crate) fn hold(&mut self, message: &str) {
        _ = self.replace(message);
    }

    pub(crate) fn current(&self) -> Option<String> {
        self.slot.borrow().as_ref().map(|slot| slot.message.clone())
    }

    fn replace(&mut self, message: &str) -> u64 {
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
        self.generation += 1;
        debug!("Showing notification {}: {}", self.generation, message);
        _ = self.slot.send_replace(Some(Slot {
            generation: self.generation,
            message: message.to_owned(),
        }));
        self.generation
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
    }
}
