//! Finding projects from a working directory or a half-remembered name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{ProjectMetadata, Registry};

/// Below this Jaro-Winkler score a name is not offered as a suggestion.
const MIN_SIMILARITY: f64 = 0.7;

/// The registered project containing `dir`.
///
/// When project roots nest, the deepest one wins. Paths are compared after
/// canonicalization where possible so symlinked checkouts still match.
pub fn detect<'a>(registry: &'a Registry, dir: &Path) -> Option<&'a ProjectMetadata> {
    let dir = canonical(dir);
    registry
        .projects
        .values()
        .filter(|p| dir.starts_with(canonical(&p.path)))
        .max_by_key(|p| canonical(&p.path).components().count())
}

/// A candidate project name with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameMatch {
    pub name: String,
    pub score: f64,
}

/// Rank project names by similarity to `query`, best first.
///
/// Exact (case-insensitive) matches score 1.0, prefix matches are boosted
/// above fuzzy ones.
pub fn fuzzy_matches(registry: &Registry, query: &str, limit: usize) -> Vec<NameMatch> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<NameMatch> = registry
        .projects
        .keys()
        .filter_map(|name| {
            let lower = name.to_lowercase();
            let score = if lower == query {
                1.0
            } else if lower.starts_with(&query) || lower.contains(&query) {
                0.9 + 0.09 * strsim::jaro_winkler(&lower, &query)
            } else {
                strsim::jaro_winkler(&lower, &query)
            };
            (score >= MIN_SIMILARITY).then(|| NameMatch {
                name: name.clone(),
                score,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });
    matches.truncate(limit);
    matches
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
