use std::collections::{BTreeMap, HashMap};

use crate::models::Coordinate;

/// Where reference coordinates come from, keyed by station name.
pub trait ReferenceSource: Sync {
    fn lookup(&self, name: &str) -> Option<Coordinate>;
}

impl ReferenceSource for HashMap<String, Coordinate> {
    fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.get(name).copied()
    }
}

impl ReferenceSource for hashbrown::HashMap<String, Coordinate> {
    fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.get(name).copied()
    }
}

impl ReferenceSource for BTreeMap<String, Coordinate> {
    fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.get(name).copied()
    }
}

/// Tries each source in order and returns the first hit, e.g. a
/// "<name> MTR station" geocode before a plain "<name> station" one.
#[derive(Default)]
pub struct ReferenceChain<'a> {
    sources: Vec<&'a dyn ReferenceSource>,
}

impl<'a> ReferenceChain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &'a dyn ReferenceSource) -> Self {
        self.sources.push(source);
        self
    }
}

impl ReferenceSource for ReferenceChain<'_> {
    fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.sources.iter().find_map(|s| s.lookup(name))
    }
}
