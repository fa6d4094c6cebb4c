//! Quality gate and ranking for third-party learning resources.
//!
//! Pure and deterministic: the same candidates always produce the same output.

use url::Url;

use crate::model::Resource;

/// Most resources kept per subskill.
pub const MAX_RESOURCES_PER_SUBSKILL: usize = 4;

const MIN_TITLE_CHARS: usize = 10;
const MIN_DESCRIPTION_CHARS: usize = 20;

/// Hosts that only ever serve sandbox or placeholder content.
const PLACEHOLDER_HOSTS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "localhost",
    "127.0.0.1",
    "placeholder.com",
    "dummy.com",
];

/// Reserved top-level labels that never resolve to real content.
const PLACEHOLDER_TLDS: &[&str] = &["test", "example", "invalid", "localhost"];

/// Filler phrases that mark generated or placeholder entries.
const LOW_QUALITY_MARKERS: &[&str] = &[
    "lorem ipsum",
    "placeholder",
    "example",
    "test content",
    "dummy text",
    "sample data",
];

/// Reputable learning and reference sites. An entry may carry a path prefix.
const TRUSTED_SOURCES: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "coursera.org",
    "edx.org",
    "udemy.com",
    "khanacademy.org",
    "medium.com",
    "towardsdatascience.com",
    "github.com",
    "stackoverflow.com",
    "developer.mozilla.org",
    "w3schools.com",
    "freecodecamp.org",
    "codecademy.com",
    "pluralsight.com",
    "linkedin.com/learning",
    "docs.python.org",
    "pandas.pydata.org",
    "scikit-learn.org",
    "tensorflow.org",
    "pytorch.org",
    "kaggle.com",
    "datacamp.com",
    "doc.rust-lang.org",
];

/// Ranking bucket; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Trusted = 1,
    Valid = 2,
    Unparseable = 3,
}

/// Rejects low-quality candidates and ranks survivors by domain trust.
#[derive(Debug, Clone, Copy)]
pub struct ResourceQualityFilter {
    limit: usize,
}

impl Default for ResourceQualityFilter {
    fn default() -> Self {
        Self {
            limit: MAX_RESOURCES_PER_SUBSKILL,
        }
    }
}

impl ResourceQualityFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter, rank (stable) and truncate the candidates for one subskill.
    #[must_use]
    pub fn apply(&self, candidates: Vec<Resource>) -> Vec<Resource> {
        let mut ranked: Vec<(Priority, Resource)> = candidates
            .into_iter()
            .filter(is_acceptable)
            .map(|resource| (priority_of(&resource), resource))
            .collect();
        // `sort_by_key` is stable: equal priorities keep input order.
        ranked.sort_by_key(|(priority, _)| *priority);
        ranked.truncate(self.limit);
        ranked.into_iter().map(|(_, resource)| resource).collect()
    }
}

/// True if the resource passes every quality gate.
#[must_use]
pub fn is_acceptable(resource: &Resource) -> bool {
    if resource.title().chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    if resource.description().chars().count() < MIN_DESCRIPTION_CHARS {
        return false;
    }
    let Some(host) = web_host(resource.url()) else {
        return false;
    };
    if is_placeholder_host(&host) {
        return false;
    }
    !contains_low_quality_marker(resource)
}

/// Ranking bucket for an already accepted resource.
#[must_use]
pub fn priority_of(resource: &Resource) -> Priority {
    let Ok(url) = Url::parse(resource.url()) else {
        return Priority::Unparseable;
    };
    let Some(host) = url.host_str() else {
        return Priority::Unparseable;
    };
    let host = host.to_ascii_lowercase();
    let path = url.path();
    let trusted = TRUSTED_SOURCES.iter().any(|source| {
        let (domain, prefix) = source.split_once('/').map_or((*source, None), |(d, p)| (d, Some(p)));
        host_matches(&host, domain)
            && prefix.is_none_or(|p| path.trim_start_matches('/').starts_with(p))
    });
    if trusted {
        Priority::Trusted
    } else {
        Priority::Valid
    }
}

/// Lower-cased host of an `http(s)` URL, or `None` for anything else.
fn web_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

fn is_placeholder_host(host: &str) -> bool {
    if PLACEHOLDER_HOSTS.iter().any(|d| host_matches(host, d)) {
        return true;
    }
    host.rsplit('.')
        .next()
        .is_some_and(|tld| PLACEHOLDER_TLDS.contains(&tld))
}

/// `host` equals `domain` or is one of its subdomains.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
}

fn contains_low_quality_marker(resource: &Resource) -> bool {
    let haystack = format!("{} {}", resource.title(), resource.description()).to_lowercase();
    LOW_QUALITY_MARKERS
        .iter()
        .any(|marker| haystack.contains(marker))
}
