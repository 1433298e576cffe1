//! Locator matching for visit triggers.

use quest_packet_core::VisitTrigger;
use url::Url;

/// Decides whether a visited locator satisfies a trigger.
pub trait LocatorMatcher {
    fn matches(&self, locator: &str) -> bool;
}

impl LocatorMatcher for VisitTrigger {
    fn matches(&self, locator: &str) -> bool {
        match self {
            VisitTrigger::Contains { fragment } => locator.contains(fragment.as_str()),
            VisitTrigger::Exact { locator: expected } => locator.trim() == expected.trim(),
            VisitTrigger::Domain { host } => locator_host(locator)
                .map(|visited| host_matches(&visited, host))
                .unwrap_or(false),
        }
    }
}

/// Host of `locator`, lowercased. Scheme-less locators such as
/// `google.com/search` are read as `http` URLs.
pub fn locator_host(locator: &str) -> Option<String> {
    let locator = locator.trim();
    let parsed = match Url::parse(locator) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{}", locator)).ok()?
        }
        Err(_) => return None,
    };
    parsed
        .host_str()
        .map(|host| host.trim_end_matches('.').to_ascii_lowercase())
}

fn host_matches(visited: &str, expected: &str) -> bool {
    let expected = expected.trim().trim_end_matches('.').to_ascii_lowercase();
    if expected.is_empty() {
        return false;
    }
    visited == expected
        || visited
            .strip_suffix(expected.as_str())
            .map(|prefix| prefix.ends_with('.'))
            .unwrap_or(false)
}
