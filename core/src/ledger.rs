// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;

use crate::settings::{SettingsError, SettingsStore};

/// Errors raised by the sync ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("stored sync timestamp is not valid: {0}")]
    Invalid(String),
}

/// Remembers the instant of the last successful sync.
///
/// The value is kept as epoch milliseconds under a single settings key. A
/// missing key or `0` reads as never synced.
#[derive(Clone)]
pub struct SyncLedger {
    store: Arc<dyn SettingsStore>,
}

impl fmt::Debug for SyncLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncLedger").finish_non_exhaustive()
    }
}

impl SyncLedger {
    pub const KEY: &'static str = "LAST_CONTACT_SYNC_TIMESTAMP";

    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Result<Option<Timestamp>, LedgerError> {
        let Some(value) = self.store.get(Self::KEY).await? else {
            return Ok(None);
        };
        let millis = value
            .as_i64()
            .ok_or_else(|| LedgerError::Invalid(value.to_string()))?;
        if millis == 0 {
            return Ok(None);
        }
        Timestamp::from_millisecond(millis)
            .map(Some)
            .map_err(|e| LedgerError::Invalid(e.to_string()))
    }

    pub async fn set(&self, instant: Timestamp) -> Result<(), LedgerError> {
        self.store
            .set(Self::KEY, instant.as_millisecond().into())
            .await?;
        tracing::debug!(%instant, "recorded sync timestamp");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), LedgerError> {
        self.store.remove(Self::KEY).await?;
        tracing::debug!("cleared sync timestamp");
        Ok(())
    }
}
