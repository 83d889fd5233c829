use tracing::warn;

/// Environment variable toggling [`SearcherOptions::count_from_stats`].
pub const COUNT_FROM_STATS_ENV: &str = "SOMBRA_COUNT_FROM_STATS";

/// Environment variable overriding [`SearcherOptions::max_clause_count`].
pub const MAX_CLAUSES_ENV: &str = "SOMBRA_MAX_CLAUSES";

/// Options applied to every search run by an [`crate::search::IndexSearcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearcherOptions {
    /// Whether `count` may be answered from index statistics without
    /// iterating matches.
    pub count_from_stats: bool,
    /// Maximum number of clauses a single boolean query may hold.
    pub max_clause_count: usize,
}

impl Default for SearcherOptions {
    fn default() -> Self {
        Self {
            count_from_stats: true,
            max_clause_count: 1024,
        }
    }
}

impl SearcherOptions {
    /// Defaults overridden by `SOMBRA_COUNT_FROM_STATS` and
    /// `SOMBRA_MAX_CLAUSES`. Values that do not parse are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(raw) = lookup(COUNT_FROM_STATS_ENV) {
            match parse_flag(&raw) {
                Some(flag) => opts.count_from_stats = flag,
                None => warn!(var = COUNT_FROM_STATS_ENV, value = %raw, "search.options.invalid_flag"),
            }
        }
        if let Some(raw) = lookup(MAX_CLAUSES_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(max) if max > 0 => opts.max_clause_count = max,
                _ => warn!(var = MAX_CLAUSES_ENV, value = %raw, "search.options.invalid_clause_limit"),
            }
        }
        opts
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
