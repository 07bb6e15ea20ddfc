// src/pipeline/harvest.rs

//! Harvest orchestration.
//!
//! Owns the run-wide state (dedup set, record channel, per-source rate
//! limiters), drives each source's collector, and performs the terminal
//! write. Cancellation stops new requests promptly but already-collected
//! records are still flushed; partial output is valid output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, ContentRecord};
use crate::services::{CollectOutcome, Deduplicator, FixedListCollector, SearchCollector};
use crate::storage::RecordStorage;
use crate::utils::{RateLimiter, http};

/// What a harvest run did, per source and in total.
#[derive(Debug)]
pub struct HarvestSummary {
    /// Records written to the sink
    pub records: usize,

    /// Where the snapshot landed
    pub location: String,

    /// Per-source counters
    pub sources: Vec<CollectOutcome>,

    pub elapsed: Duration,

    /// Whether the run ended by operator cancellation
    pub cancelled: bool,
}

enum Collector {
    Search(SearchCollector),
    Fixed(FixedListCollector),
}

/// Run the full harvest across all enabled sources.
pub async fn run_harvest(
    config: &Config,
    storage: &dyn RecordStorage,
    cancel: CancellationToken,
) -> Result<HarvestSummary> {
    config.validate()?;
    let started = Instant::now();

    let client = http::build_client(&config.harvester)?;
    let keywords = config.all_keywords();
    let dedup = Deduplicator::new();

    let (tx, mut rx) = mpsc::channel::<ContentRecord>(256);
    let writer = tokio::spawn(async move {
        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        records
    });

    let enabled: Vec<_> = config.sources.iter().filter(|s| s.enabled).collect();
    log::info!(
        "Harvesting {} sources with {} keywords",
        enabled.len(),
        keywords.len()
    );

    // Build every collector up front so selector/pattern mistakes surface
    // before the first request is issued.
    let mut collectors = Vec::with_capacity(enabled.len());
    for source in enabled {
        // Each source gets its own limiter: rate tolerances are independent.
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_millis(config.harvester.request_delay_ms),
            config.harvester.jitter_ms,
        ));
        let collector = if source.is_search() {
            Collector::Search(SearchCollector::new(config, source, client.clone(), limiter)?)
        } else {
            Collector::Fixed(FixedListCollector::new(
                config,
                source,
                client.clone(),
                limiter,
            )?)
        };
        collectors.push((source, collector));
    }

    let mut outcomes: Vec<CollectOutcome> = Vec::new();
    for (source, collector) in &collectors {
        if cancel.is_cancelled() {
            log::warn!("cancelled; skipping remaining sources");
            break;
        }

        log::info!("[{}] collecting from {}", source.id, source.platform);
        let outcome = match collector {
            Collector::Search(collector) => {
                collector.collect(&keywords, &dedup, &tx, &cancel).await
            }
            Collector::Fixed(collector) => collector.collect(&dedup, &tx, &cancel).await,
        };

        log::info!(
            "[{}] {} emitted / {} attempted ({} duplicate, {} fetch-failed, {} extract-failed)",
            outcome.source_id,
            outcome.emitted,
            outcome.attempted,
            outcome.duplicates,
            outcome.fetch_failures,
            outcome.extract_failures
        );
        outcomes.push(outcome);
    }

    // Close the channel so the writer drains and finishes.
    drop(tx);
    let records = writer
        .await
        .map_err(|e| AppError::harvest("record sink", e))?;

    let cancelled = cancel.is_cancelled();
    let report = storage.write_snapshot(records).await?;
    let elapsed = started.elapsed();

    log_summary(&outcomes, &report.location, report.count, elapsed, cancelled);

    Ok(HarvestSummary {
        records: report.count,
        location: report.location,
        sources: outcomes,
        elapsed,
        cancelled,
    })
}

fn log_summary(
    outcomes: &[CollectOutcome],
    location: &str,
    records: usize,
    elapsed: Duration,
    cancelled: bool,
) {
    let status = if cancelled {
        "Harvest cancelled"
    } else {
        "Harvest complete"
    };
    log::info!(
        "{status}: {records} records in {:.1}s -> {location}",
        elapsed.as_secs_f32()
    );
    for outcome in outcomes {
        log::info!(
            "  {}: {} emitted, {} attempted, {} duplicate, {} skipped ({} fetch / {} extract), {} pages",
            outcome.platform,
            outcome.emitted,
            outcome.attempted,
            outcome.duplicates,
            outcome.skipped(),
            outcome.fetch_failures,
            outcome.extract_failures,
            outcome.pages_fetched
        );
    }
}
