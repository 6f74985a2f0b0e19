//! Season metadata extraction from catalog pages.
//!
//! Every field is located with a fixed pattern against the raw body, so
//! malformed markup around a field does not affect the other fields.

use regex::Regex;
use seasongate_core::types::SeasonMeta;
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::fetcher::PageFetcher;
use crate::metrics::{Diagnostic, Metrics};
use crate::{ExtractionError, MetadataError};

static RE_SEASON_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-id-season="([0-9]+)""#).unwrap());

static RE_SERIAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-id-serial="([0-9]+)""#).unwrap());

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").unwrap());

static RE_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="keywords" content="([^"]+)""#).unwrap());

static RE_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="description" content="([^"]+)""#).unwrap());

fn capture_id(re: &Regex, body: &str) -> Option<u64> {
    re.captures(body)
        .and_then(|c| c[1].parse().ok())
        .filter(|id| *id != 0)
}

fn capture_text(re: &Regex, body: &str) -> Option<String> {
    re.captures(body).map(|c| c[1].to_string())
}

pub fn season_id(body: &str) -> Option<u64> {
    capture_id(&RE_SEASON_ID, body)
}

pub fn serial_id(body: &str) -> Option<u64> {
    capture_id(&RE_SERIAL_ID, body)
}

pub fn season_title(body: &str) -> Option<String> {
    capture_text(&RE_TITLE, body)
}

pub fn season_keywords(body: &str) -> Option<String> {
    capture_text(&RE_KEYWORDS, body)
}

pub fn season_description(body: &str) -> Option<String> {
    capture_text(&RE_DESCRIPTION, body)
}

/// Build a [`SeasonMeta`] from a page body.
///
/// Season and serial ids are mandatory. Missing optional fields become empty
/// strings and bump their diagnostic counter.
pub fn extract_season_meta(body: &str, metrics: &Metrics) -> Result<SeasonMeta, ExtractionError> {
    let Some(id) = season_id(body) else {
        metrics.incr(Diagnostic::SeasonIdMissing);
        return Err(ExtractionError::SeasonIdMissing);
    };
    let Some(serial) = serial_id(body) else {
        metrics.incr(Diagnostic::SerialIdMissing);
        return Err(ExtractionError::SerialIdMissing);
    };

    let optional = |value: Option<String>, missing: Diagnostic| {
        value.unwrap_or_else(|| {
            metrics.incr(missing);
            String::new()
        })
    };

    Ok(SeasonMeta {
        id,
        serial,
        title: optional(season_title(body), Diagnostic::SeasonTitleMissing),
        keywords: optional(season_keywords(body), Diagnostic::SeasonKeywordsMissing),
        description: optional(
            season_description(body),
            Diagnostic::SeasonDescriptionMissing,
        ),
    })
}

/// Fetches catalog pages and turns them into season metadata.
#[derive(Clone)]
pub struct SeasonFetcher {
    pages: Arc<dyn PageFetcher>,
    metrics: Metrics,
}

impl SeasonFetcher {
    pub fn new(pages: Arc<dyn PageFetcher>, metrics: Metrics) -> Self {
        Self { pages, metrics }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn pages(&self) -> &Arc<dyn PageFetcher> {
        &self.pages
    }

    /// Fetch `link` once and extract its metadata.
    pub async fn fetch(&self, link: &str) -> Result<SeasonMeta, MetadataError> {
        self.metrics.record_fetch();
        let body = self.pages.get(link, &[]).await.inspect_err(|e| {
            self.metrics.incr(Diagnostic::FetchFailure);
            warn!(link = %link, error = %e, "page fetch failed");
        })?;

        let meta = extract_season_meta(&body, &self.metrics)?;
        debug!(link = %link, id = meta.id, serial = meta.serial, "season meta extracted");
        Ok(meta)
    }
}
