// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::sync::Arc;

use jiff::Timestamp;
use tokio::fs;

use crate::cache::ContactCache;
use crate::coordinator::{Clock, SyncCoordinator};
use crate::device::Device;
use crate::ledger::SyncLedger;
use crate::localdb::LocalDb;
use crate::observer::ChangeObserver;
use crate::session::SessionController;
use crate::settings::{JsonFileSettings, MemorySettings, SettingsStore};
use crate::source::ContactReader;
use crate::{Config, Contact};

/// Contact sync application core.
///
/// Owns the cache database and the settings store for one process and hands
/// out sessions that share a single coordinator.
#[derive(Debug, Clone)]
pub struct ContactSync {
    device: Device,
    db: LocalDb,
    cache: ContactCache,
    ledger: SyncLedger,
    coordinator: SyncCoordinator,
}

impl ContactSync {
    /// Opens the cache and settings under the configured state directory.
    pub async fn new(mut config: Config, device: Device) -> Result<Self, Box<dyn Error>> {
        config.normalize()?;
        prepare(&config).await?;

        let db = LocalDb::open(config.database_path().as_deref())
            .await
            .map_err(|e| format!("Failed to initialize db: {e}"))?;

        let settings: Arc<dyn SettingsStore> = match config.settings_path() {
            Some(path) => Arc::new(
                JsonFileSettings::open(path)
                    .await
                    .map_err(|e| format!("Failed to open settings: {e}"))?,
            ),
            None => Arc::new(MemorySettings::new()),
        };

        Self::assemble(device, db, settings).await
    }

    /// Keeps the cache and the settings in memory only.
    pub async fn in_memory(device: Device) -> Result<Self, Box<dyn Error>> {
        let db = LocalDb::open(None)
            .await
            .map_err(|e| format!("Failed to initialize db: {e}"))?;
        Self::assemble(device, db, Arc::new(MemorySettings::new())).await
    }

    async fn assemble(
        device: Device,
        db: LocalDb,
        settings: Arc<dyn SettingsStore>,
    ) -> Result<Self, Box<dyn Error>> {
        let cache = ContactCache::new(db.clone())
            .await
            .map_err(|e| format!("Failed to load contact cache: {e}"))?;
        let ledger = SyncLedger::new(settings);
        let coordinator = SyncCoordinator::new(
            ContactReader::new(device.source.clone()),
            cache.clone(),
            ledger.clone(),
        );

        Ok(Self {
            device,
            db,
            cache,
            ledger,
            coordinator,
        })
    }

    /// Replaces the clock recorded by syncs. Sessions created afterwards use it.
    pub fn with_clock(self, clock: Clock) -> Self {
        let coordinator = SyncCoordinator::with_clock(
            ContactReader::new(self.device.source.clone()),
            self.cache.clone(),
            self.ledger.clone(),
            clock,
        );
        Self {
            coordinator,
            ..self
        }
    }

    pub fn cache(&self) -> &ContactCache {
        &self.cache
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.ledger
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Starts a new session with fresh session flags.
    pub fn session(&self) -> SessionController {
        SessionController::new(
            self.coordinator.clone(),
            ChangeObserver::new(self.device.notifier.clone()),
            self.device.permission.clone(),
        )
    }

    /// All cached contacts ordered by name.
    pub async fn list_contacts(&self) -> Result<Vec<Contact>, Box<dyn Error>> {
        Ok(self.cache.list().await?)
    }

    pub async fn get_contact(&self, id: &str) -> Result<Option<Contact>, Box<dyn Error>> {
        Ok(self.cache.get(id).await?)
    }

    pub async fn status(&self) -> Result<SyncStatus, Box<dyn Error>> {
        Ok(SyncStatus {
            cached: self.cache.count().await?,
            last_sync: self.ledger.get().await?,
        })
    }

    /// Forgets every cached contact and the last sync, so the next sync is full.
    pub async fn reset(&self) -> Result<(), Box<dyn Error>> {
        if self.coordinator.is_syncing() {
            return Err("Cannot reset while a sync is in progress".into());
        }
        let removed = self.cache.clear().await?;
        self.ledger.clear().await?;
        tracing::info!(removed, "reset contact cache");
        Ok(())
    }

    pub async fn close(self) -> Result<(), Box<dyn Error>> {
        self.db.close().await
    }
}

/// Cached count and last successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub cached: usize,
    pub last_sync: Option<Timestamp>,
}

async fn prepare(config: &Config) -> Result<(), Box<dyn Error>> {
    if let Some(state_dir) = &config.state_dir {
        tracing::info!(path = %state_dir.display(), "ensuring state directory exists");
        fs::create_dir_all(state_dir)
            .await
            .map_err(|e| format!("Failed to create state directory: {e}"))?;
    }

    Ok(())
}
