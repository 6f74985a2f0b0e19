/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub db_path: String,
    /// Host (and optional port) of the catalog site being fronted.
    pub upstream_host: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            bind: var("SEASONGATE_BIND", "0.0.0.0:8080"),
            db_path: var("SEASONGATE_DB", "seasongate.db"),
            upstream_host: var("SEASONGATE_UPSTREAM", "seasonvar.ru"),
        }
    }

    pub fn upstream_origin(&self) -> String {
        format!("http://{}", self.upstream_host)
    }

    /// Absolute upstream link for a request URI such as `/serial-1-x.html?a=b`.
    pub fn absolute_link(&self, request_uri: &str) -> String {
        format!("{}{request_uri}", self.upstream_origin())
    }
}
