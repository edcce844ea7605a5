#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal helpers for the franchise zones CLI.
//!
//! The CLI shows two kinds of progress: a spinner while the commune record
//! store loads, and a dataset counter while `build-cache` warms the caches.
//! Both go through [`TerminalProgress`], which implements the ingestion
//! [`ProgressCallback`]. Log lines are routed through
//! `indicatif-log-bridge` by [`init_logger`] so they print above the bars.

use std::sync::Arc;
use std::time::Duration;

use franchise_zones_ingest::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "franchise_zones=info";

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} [{elapsed}]";
const DATASETS_TEMPLATE: &str = "{msg:28} {bar:30.green/dim} {pos}/{len} datasets [{elapsed}]";

/// Shape of a progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    /// Unknown amount of work.
    Spinner,
    /// A known number of datasets.
    Datasets,
}

impl BarKind {
    fn style(self) -> ProgressStyle {
        match self {
            Self::Spinner => ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            Self::Datasets => ProgressStyle::with_template(DATASETS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        }
    }
}

/// Progress shown on the terminal for one loading step.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// Adds a bar of `kind` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, kind: BarKind, message: &str) -> Self {
        let bar = match kind {
            BarKind::Spinner => {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
            BarKind::Datasets => multi.add(ProgressBar::new(0)),
        };
        bar.set_style(kind.style());
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Spinner shown while the record store loads.
    #[must_use]
    pub fn spinner(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        Arc::new(Self::new(multi, BarKind::Spinner, message))
    }

    /// Dataset counter for cache warm-up, `total` datasets long.
    #[must_use]
    pub fn steps_bar(multi: &MultiProgress, message: &str, total: u64) -> Arc<dyn ProgressCallback> {
        let progress = Self::new(multi, BarKind::Datasets, message);
        progress.bar.set_length(total);
        Arc::new(progress)
    }
}

impl ProgressCallback for TerminalProgress {
    fn set_total(&self, total: u64) {
        // A spinner that learns its length becomes a dataset counter.
        if self.bar.length().is_none() {
            self.bar.disable_steady_tick();
            self.bar.set_style(BarKind::Datasets.style());
        }
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// The filter comes from `RUST_LOG`, or [`DEFAULT_LOG_FILTER`] when it is
/// unset. Returns the [`MultiProgress`] every bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(&filter)
        .build();
    let level = logger.filter();

    // Keeps the first logger if one is already installed.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
