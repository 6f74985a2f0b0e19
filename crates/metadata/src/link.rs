use regex::Regex;
use std::sync::LazyLock;

use crate::MetadataError;

// "/serial-482-show-name/season-1.html"
static RE_LINK_IDENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"serial-([0-9]+)-").unwrap());

/// Extract the catalog identity embedded in a page link.
pub fn resolve_link_identity(link: &str) -> Result<u64, MetadataError> {
    RE_LINK_IDENTITY
        .captures(link)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| MetadataError::IdentityNotFound(link.to_string()))
}
