use serde::{Deserialize, Serialize};

/// Season metadata scraped from a catalog page.
///
/// `id` and `serial` come from the page content and are never zero for a
/// stored record. The descriptive fields are empty when the page lacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonMeta {
    pub title: String,
    pub id: u64,
    pub serial: u64,
    pub keywords: String,
    pub description: String,
}

/// A client self-report, keyed by the client IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub ip: String,
    pub user_agent: String,
    pub secure_mark: String,
}

impl User {
    /// Whether the client asked for the secured page variant.
    pub fn is_secured(&self) -> bool {
        !self.secure_mark.is_empty()
    }
}

/// Disjoint key spaces inside the single store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Users,
    Meta,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Meta => "meta",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
