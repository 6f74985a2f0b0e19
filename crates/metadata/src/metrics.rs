//! Diagnostic counters for page fetching and extraction.
//!
//! The registry is owned by [`Metrics`] rather than the process-global
//! default, so each server instance (and each test) counts independently.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Events counted by the `seasongate_diagnostics_total` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    SeasonTitleMissing,
    SeasonKeywordsMissing,
    SeasonDescriptionMissing,
    SeasonIdMissing,
    SerialIdMissing,
    FetchFailure,
    RenderFailure,
}

impl Diagnostic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SeasonTitleMissing => "season_title_missing",
            Self::SeasonKeywordsMissing => "season_keywords_missing",
            Self::SeasonDescriptionMissing => "season_description_missing",
            Self::SeasonIdMissing => "season_id_missing",
            Self::SerialIdMissing => "serial_id_missing",
            Self::FetchFailure => "fetch_failure",
            Self::RenderFailure => "render_failure",
        }
    }
}

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    page_fetches: IntCounter,
    diagnostics: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let page_fetches = IntCounter::new(
            "seasongate_page_fetches_total",
            "Total number of upstream page fetches",
        )?;
        let diagnostics = IntCounterVec::new(
            Opts::new(
                "seasongate_diagnostics_total",
                "Extraction, fetch and render failures by event",
            ),
            &["event"],
        )?;

        registry.register(Box::new(page_fetches.clone()))?;
        registry.register(Box::new(diagnostics.clone()))?;

        Ok(Self {
            registry,
            page_fetches,
            diagnostics,
        })
    }

    pub fn record_fetch(&self) {
        self.page_fetches.inc();
    }

    pub fn incr(&self, event: Diagnostic) {
        self.diagnostics.with_label_values(&[event.as_str()]).inc();
    }

    pub fn fetches(&self) -> u64 {
        self.page_fetches.get()
    }

    pub fn count(&self, event: Diagnostic) -> u64 {
        self.diagnostics.with_label_values(&[event.as_str()]).get()
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
