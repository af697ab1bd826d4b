use ahash::{AHashMap, AHashSet};
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Upper bound on counters tried for a single candidate.
pub const MAX_COLLISION_PROBES: u32 = 10_000;

/// Names already taken in the destination directory, both by files that
/// were there before the batch and by destinations claimed during planning.
#[derive(Debug, Default, Clone)]
pub struct DestinationRegistry {
    claimed: AHashSet<String>,
    case_insensitive: bool,
}

impl DestinationRegistry {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            claimed: AHashSet::new(),
            case_insensitive,
        }
    }

    pub fn with_existing<I, S>(names: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new(case_insensitive);
        for name in names {
            registry.claim(name.as_ref());
        }
        registry
    }

    /// Seed from every entry (files and directories) currently in `dir`.
    pub fn from_directory(dir: &Path, case_insensitive: bool) -> io::Result<Self> {
        let mut registry = Self::new(case_insensitive);
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => {
                    registry.claim(&name);
                }
                Err(raw) => warn!("Skipping non UTF-8 name {:?} in {}", raw, dir.display()),
            }
        }
        debug!("Registry seeded with {} names from {}", registry.len(), dir.display());
        Ok(registry)
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains(&self.key(name))
    }

    /// Returns false if the name was already taken.
    pub fn claim(&mut self, name: &str) -> bool {
        let key = self.key(name);
        self.claimed.insert(key)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Assigns each dated name a destination that is unique within the batch
/// and does not clash with anything already in the directory.
#[derive(Debug)]
pub struct CollisionResolver {
    registry: DestinationRegistry,
    /// Next counter to try per candidate, so repeats don't probe from 1.
    next_counter: AHashMap<String, u32>,
}

impl CollisionResolver {
    pub fn new(registry: DestinationRegistry) -> Self {
        Self {
            registry,
            next_counter: AHashMap::new(),
        }
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Claim `<date>_<base><ext>`, or the first free `<date>_<base>(n)<ext>`.
    /// `None` only when every counter up to the probe bound is taken.
    pub fn resolve_one(&mut self, date: NaiveDate, base: &str, extension: &str) -> Option<String> {
        let stem = format!("{}_{}", date.format("%Y-%m-%d"), base);
        let candidate = format!("{}{}", stem, extension);
        if self.registry.claim(&candidate) {
            return Some(candidate);
        }

        let counter_key = self.registry.key(&candidate);
        let start = self.next_counter.get(&counter_key).copied().unwrap_or(1);
        for counter in start..start.saturating_add(MAX_COLLISION_PROBES) {
            let name = format!("{}({}){}", stem, counter, extension);
            if self.registry.claim(&name) {
                self.next_counter.insert(counter_key, counter + 1);
                return Some(name);
            }
        }

        warn!("No free name for '{}' after {} attempts", candidate, MAX_COLLISION_PROBES);
        None
    }

    /// Resolve a whole batch in discovery order.
    pub fn resolve<'a, I>(&mut self, batch: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = (NaiveDate, &'a str, &'a str)>,
    {
        batch
            .into_iter()
            .map(|(date, base, ext)| self.resolve_one(date, base, ext))
            .collect()
    }

    pub fn into_registry(self) -> DestinationRegistry {
        self.registry
    }
}
