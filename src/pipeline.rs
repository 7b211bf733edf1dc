use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::db::{ApplicationRecord, RecordStore};
use crate::fetch::PageFetcher;
use crate::pacing::Pacing;
use crate::parser::{self, dates, detail::DetailFields};

/// Where the listing lives and what goes into every record.
pub struct Source {
    pub listing_url: String,
    pub listing_selector: String,
    pub comment_url: String,
}

/// Outcome counts for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub listed: usize,
    pub inserted: usize,
    pub existing: usize,
    pub skipped: usize,
    pub fetch_failed: usize,
    pub store_failed: usize,
}

pub struct Pipeline<'a, F> {
    fetcher: &'a F,
    store: &'a RecordStore,
    pacing: Pacing,
    source: &'a Source,
    scrape_date: NaiveDate,
}

impl<'a, F: PageFetcher> Pipeline<'a, F> {
    pub fn new(
        fetcher: &'a F,
        store: &'a RecordStore,
        pacing: Pacing,
        source: &'a Source,
        scrape_date: NaiveDate,
    ) -> Self {
        Self {
            fetcher,
            store,
            pacing,
            source,
            scrape_date,
        }
    }

    /// Listing failures abort the run; detail failures are logged and skipped.
    pub async fn run(&self) -> Result<RunStats> {
        let base = parser::listing::base_url(&self.source.listing_url)?;

        let listing = self
            .fetcher
            .fetch(&self.source.listing_url)
            .await
            .context("Failed to fetch listing page")?;

        let urls = parser::parse_listing(&listing, &self.source.listing_selector, &base)?;
        let mut stats = RunStats {
            listed: urls.len(),
            ..RunStats::default()
        };

        if urls.is_empty() {
            info!("No applications found on {}", self.source.listing_url);
            return Ok(stats);
        }
        info!("Found {} applications on the listing page", urls.len());

        let pb = ProgressBar::new(urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({eta})")?
                .progress_chars("=> "),
        );

        for url in &urls {
            self.pacing.wait().await;
            self.process_one(url, &mut stats).await;
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Run complete: {} listed, {} inserted, {} already present, {} skipped, {} failed",
            stats.listed,
            stats.inserted,
            stats.existing,
            stats.skipped,
            stats.fetch_failed + stats.store_failed,
        );
        Ok(stats)
    }

    async fn process_one(&self, url: &str, stats: &mut RunStats) {
        let markup = match self.fetcher.fetch(url).await {
            Ok(m) => m,
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping application: fetch failed");
                stats.fetch_failed += 1;
                return;
            }
        };

        let fields = parser::parse_detail(&markup);
        if fields.application_number.is_empty() {
            warn!(url = %url, "Skipping application: no application number on page");
            stats.skipped += 1;
            return;
        }

        let record = self.build_record(url, fields);
        match self.store.upsert(&record) {
            Ok(r) if r.inserted => {
                info!("Inserted new application \"{}\" into the database.", record.council_reference);
                stats.inserted += 1;
            }
            Ok(_) => {
                debug!(reference = %record.council_reference, "Already present");
                stats.existing += 1;
            }
            Err(e) => {
                warn!(
                    url = %url,
                    reference = %record.council_reference,
                    error = %e,
                    "Failed to save application"
                );
                stats.store_failed += 1;
            }
        }
    }

    fn build_record(&self, url: &str, fields: DetailFields) -> ApplicationRecord {
        let on_notice_to = dates::parse_notice_date(&fields.closing_date);
        if on_notice_to.is_none() && !fields.closing_date.is_empty() {
            debug!(url = %url, text = %fields.closing_date, "Unrecognised closing date");
        }

        ApplicationRecord {
            council_reference: fields.application_number,
            address: fields.address,
            description: fields.description,
            info_url: url.to_string(),
            comment_url: self.source.comment_url.clone(),
            date_scraped: self.scrape_date,
            date_received: dates::parse_notice_date(&fields.lodged_date),
            on_notice_from: None,
            on_notice_to,
        }
    }
}
