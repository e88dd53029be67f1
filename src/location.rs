//! Location registry: maps static annotation sites to published [`Location`]s.
//!
//! Every `trace_scope!`/`trace_point!` invocation owns a file-local `static`
//! marker; the marker's address is a stable, process-unique key for the
//! lifetime of the binary (the same trick `tracing`'s own `span!`/`event!`
//! macros use with their per-callsite `static` callsites).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::config;

/// A zero-sized, trivially-typed per-site marker. Only its address matters.
pub struct SiteMarker(());

impl SiteMarker {
    /// Value every `static SiteMarker` declared by the macros is initialized with.
    pub const INIT: SiteMarker = SiteMarker(());
}

/// Opaque, process-stable identifier for an annotation site.
pub type SiteKey = usize;

/// Sentinel key for the synthetic root of every per-thread call tree. No real
/// `&'static SiteMarker` is ever at address zero, so it can't collide.
pub const ROOT_KEY: SiteKey = 0;

pub fn site_key(marker: &'static SiteMarker) -> SiteKey {
    marker as *const SiteMarker as usize
}

/// An immutable, published description of a source-level annotation site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    label: Option<&'static str>,
    file: Option<&'static str>,
    line: Option<u32>,
    anonymous_id: u32,
}

impl Location {
    fn new(label: Option<&'static str>, file: Option<&'static str>, line: Option<u32>, anonymous_id: u32) -> Self {
        Location { label, file, line, anonymous_id }
    }

    /// Dense id assigned on first publication; stable for the process lifetime.
    pub fn anonymous_id(&self) -> u32 {
        self.anonymous_id
    }

    /// Human label, e.g. `"step1 (3)"`, or `"trace_3"` if the site had no label.
    pub fn label_str(&self) -> String {
        match self.label {
            Some(label) => format!("{} ({})", label, self.anonymous_id),
            None => format!("trace_{}", self.anonymous_id),
        }
    }

    /// `file:line`, or empty if the site carries no source location.
    pub fn location_str(&self) -> String {
        match (self.file, self.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            _ => String::new(),
        }
    }

    fn anonymized(&self) -> Location {
        Location::new(None, None, None, self.anonymous_id)
    }
}

#[derive(Default)]
pub struct LocationRegistry {
    locations: Mutex<HashMap<SiteKey, Location>>,
    next_anonymous_id: AtomicU32,
}

impl LocationRegistry {
    /// Idempotent: the first publication for a given `key` wins. Concurrent
    /// publications of the same key from different threads converge to
    /// exactly one `Location`.
    pub fn publish(&self, key: SiteKey, label: Option<&'static str>, file: Option<&'static str>, line: Option<u32>) {
        let mut locations = self.locations.lock().expect("location registry poisoned");
        locations.entry(key).or_insert_with(|| {
            let id = self.next_anonymous_id.fetch_add(1, Ordering::Relaxed);
            Location::new(label, file, line, id)
        });
    }

    /// Looking up a key that was never published is a programmer error: the
    /// `trace_point!` macro always publishes before looking up, so reaching
    /// this with a miss means a `Location` was requested out of band.
    pub fn lookup(&self, key: SiteKey) -> Location {
        let locations = self.locations.lock().expect("location registry poisoned");
        let location = locations
            .get(&key)
            .unwrap_or_else(|| panic!("lookup of unpublished trace location {:#x}", key))
            .clone();
        if config::config().anonymize() {
            location.anonymized()
        } else {
            location
        }
    }
}

pub fn registry() -> &'static LocationRegistry {
    static REGISTRY: OnceLock<LocationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(LocationRegistry::default)
}
