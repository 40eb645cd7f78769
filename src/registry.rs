//! Lookup of filters and writers by configuration key.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::error::{Error, Result};
use crate::traits::{Filter, FilterWriter};

type FilterFactory = Box<dyn Fn() -> Box<dyn Filter>>;
type WriterFactory = Box<dyn Fn() -> Box<dyn FilterWriter>>;

/// Maps configuration keys such as `okf_plaintext` to factories producing
/// fresh [`Filter`] and [`FilterWriter`] instances, so pipelines can be
/// assembled from names in configuration files.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterFactory>,
    writers: HashMap<String, WriterFactory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        FilterRegistry::default()
    }

    pub fn register_filter(
        &mut self,
        key: impl Into<String>,
        factory: impl Fn() -> Box<dyn Filter> + 'static,
    ) {
        self.filters.insert(key.into(), Box::new(factory));
    }

    pub fn register_writer(
        &mut self,
        key: impl Into<String>,
        factory: impl Fn() -> Box<dyn FilterWriter> + 'static,
    ) {
        self.writers.insert(key.into(), Box::new(factory));
    }

    pub fn has_filter(&self, key: &str) -> bool {
        self.filters.contains_key(key)
    }

    pub fn has_writer(&self, key: &str) -> bool {
        self.writers.contains_key(key)
    }

    /// A new instance of the filter registered under `key`.
    pub fn create_filter(&self, key: &str) -> Result<Box<dyn Filter>> {
        match self.filters.get(key) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownConfiguration(key.to_string())),
        }
    }

    /// A new instance of the writer registered under `key`.
    pub fn create_writer(&self, key: &str) -> Result<Box<dyn FilterWriter>> {
        match self.writers.get(key) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownConfiguration(key.to_string())),
        }
    }

    /// The registered filter keys, sorted.
    pub fn filter_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// The registered writer keys, sorted.
    pub fn writer_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.writers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Debug for FilterRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.filter_keys())
            .field("writers", &self.writer_keys())
            .finish()
    }
}
