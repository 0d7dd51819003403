//! Extraction of `var Cm<Name>Base = "...";` assignments from the modem's status page.
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, info, warn};

use super::fields::{ChannelVector, decode_fields};
use crate::error::PollError;

// `R` makes `^`/`$` treat `\r\n` as a line break; the payload may hold any byte except `"`.
static STATUS_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?mR)^var Cm([A-Za-z0-9_]+)Base[ \t]*=[ \t]*"((?-u:[^"])*)";$"#)
        .expect("status assignment pattern is valid")
});

/// A single script assignment found on the page, before its payload is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAssignment<'a> {
    pub name: Cow<'a, str>,
    pub payload: Cow<'a, str>,
}

/// Yields every status assignment on the page in document order.
pub fn scan_assignments(page: &[u8]) -> impl Iterator<Item = RawAssignment<'_>> {
    STATUS_ASSIGNMENT.captures_iter(page).map(|caps| {
        let (_, [name, payload]) = caps.extract();
        RawAssignment {
            name: String::from_utf8_lossy(name),
            payload: String::from_utf8_lossy(payload),
        }
    })
}

/// Decoded channel metrics keyed by the name captured from the page, e.g. `DownstreamSnr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTable {
    channels: HashMap<String, ChannelVector>,
}

impl StatusTable {
    /// Returns the metric, or all zeros when the page never mentioned it.
    pub fn get(&self, key: &str) -> ChannelVector {
        self.channels.get(key).copied().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.channels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl FromIterator<(String, ChannelVector)> for StatusTable {
    fn from_iter<I: IntoIterator<Item = (String, ChannelVector)>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}

/// Builds a [`StatusTable`] from the raw status page.
///
/// Later assignments of the same name replace earlier ones. A payload that fails to
/// decode aborts the whole scrape rather than leaving a silently wrong row.
pub fn scrape_status(page: &[u8]) -> Result<StatusTable, PollError> {
    let mut channels = HashMap::new();
    let mut matched = 0usize;

    for assignment in scan_assignments(page) {
        matched += 1;
        let vector = decode_fields(&assignment.payload).map_err(|source| {
            PollError::MalformedField {
                key: assignment.name.to_string(),
                source,
            }
        })?;
        debug!(key = %assignment.name, values = ?vector.values(), "Decoded status field.");
        channels.insert(assignment.name.into_owned(), vector);
    }

    if matched == 0 {
        warn!(
            page_bytes = page.len(),
            "No status assignments found on page; the page format may have changed."
        );
    } else {
        debug!(matched, keys = channels.len(), "Scraped status page.");
    }

    Ok(StatusTable { channels })
}

/// Reads a status page previously saved from the modem, for offline rendering.
pub fn read_saved_page(path: &Path) -> Result<Vec<u8>, PollError> {
    info!(path = ?path, "Reading saved status page.");
    std::fs::read(path).map_err(|source| PollError::Read {
        path: path.to_path_buf(),
        source,
    })
}
