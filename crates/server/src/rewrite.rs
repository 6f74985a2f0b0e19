//! Body rewriting for proxied upstream content.

use regex::bytes::{NoExpand, Regex, RegexBuilder};
use std::sync::LazyLock;

// Pre-roll ad loader injected ahead of the player. `.` never crosses a line.
static RE_PREROLL: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"<script type="text/javascript">var.*</script>"#)
        .unicode(false)
        .build()
        .unwrap()
});

// "Popular" promo widget in the player sidebar.
static RE_POPULAR: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r#"<li class="label"><span data-help-tr="tr" class="svico-help">.*</span></li>"#,
    )
    .unicode(false)
    .build()
    .unwrap()
});

/// Delete the pre-roll script and the popular widget from a player body.
/// Anything that does not match a signature exactly is left as is.
pub fn strip_promotions(body: &[u8]) -> Vec<u8> {
    let without_preroll = RE_PREROLL.replace_all(body, NoExpand(b""));
    RE_POPULAR
        .replace_all(&without_preroll, NoExpand(b""))
        .into_owned()
}

/// Point an upstream script at this host and switch its HD toggle off.
pub fn rewrite_script(script: &str, upstream_host: &str, public_host: Option<&str>) -> String {
    let script = match public_host {
        Some(host) if !host.is_empty() => script.replace(upstream_host, host),
        _ => script.to_string(),
    };
    script
        .replace("swichHDno:", "swichHDdisabled:")
        .replace("swichHD:", "swichHDno:")
}
