//! Crash recovery
//!
//! A crawl is resumed by replaying every record that was discovered but never
//! completed. Seeds are only added when the save file holds no records.

use super::Frontier;
use crate::config::Config;
use crate::storage::{open_store, remove_database, RecordStore};
use crate::url::UrlFilter;
use crate::Result;
use std::path::Path;
use std::time::Duration;

/// What the frontier found when it was opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records present in the save file before seeding
    pub total_records: u64,

    /// Incomplete records queued again
    pub pending_replayed: usize,

    /// Incomplete records dropped because the filter now rejects them
    pub filtered_out: usize,

    /// Seed URLs added
    pub seeded: usize,
}

impl Frontier {
    /// Opens the frontier for a crawl
    ///
    /// With `restart` set the save file (and its WAL siblings) is deleted and
    /// the crawl starts from the seed URLs. Otherwise the save file is reused
    /// and pending records are replayed.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    /// * `restart` - Discard previous progress
    /// * `filter` - Eligibility filter applied to replayed records
    pub fn open(
        config: &Config,
        restart: bool,
        filter: &UrlFilter,
    ) -> Result<(Self, RecoveryReport)> {
        let path = Path::new(&config.output.save_file);

        if restart {
            tracing::info!("Restarting crawl, deleting save file {}", path.display());
            remove_database(path)?;
        } else if path.exists() {
            tracing::info!("Resuming crawl from save file {}", path.display());
        } else {
            tracing::info!("Save file {} not found, starting new crawl", path.display());
        }

        let store = open_store(path)?;
        Self::recover(
            Box::new(store),
            config.crawler.politeness_delay(),
            &config.crawler.seed_urls,
            Some(filter),
        )
    }

    /// Builds a frontier from an existing store, replaying incomplete records
    ///
    /// Replayed URLs are queued without rewriting their records. When the
    /// store is empty the seeds are added instead.
    pub fn recover(
        store: Box<dyn RecordStore>,
        delay: Duration,
        seeds: &[String],
        filter: Option<&UrlFilter>,
    ) -> Result<(Self, RecoveryReport)> {
        let records = store.all_records()?;
        let frontier = Self::new(store, delay);

        let mut report = RecoveryReport {
            total_records: records.len() as u64,
            ..RecoveryReport::default()
        };

        for record in records.into_iter().filter(|r| !r.completed) {
            if filter.map_or(true, |f| f.is_eligible(&record.url)) {
                frontier.enqueue(record.domain, record.url);
                report.pending_replayed += 1;
            } else {
                tracing::debug!("Not replaying {}: no longer eligible", record.url);
                report.filtered_out += 1;
            }
        }

        tracing::info!(
            "Found {} urls to be downloaded from {} total urls discovered",
            report.pending_replayed,
            report.total_records
        );

        if report.total_records == 0 {
            for seed in seeds {
                if frontier.add_url(seed)? {
                    report.seeded += 1;
                }
            }
            tracing::info!("Seeded frontier with {} urls", report.seeded);
        }

        Ok((frontier, report))
    }
}
