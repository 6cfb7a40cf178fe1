//! Case-insensitive, insertion-ordered header storage.
//!
//! Unlike [`http::HeaderMap`], names keep the case they were first inserted with. That
//! canonical name is what iteration yields; every lookup ignores case.

use std::collections::HashMap;

use http::{HeaderName, HeaderValue};

use crate::ensure;
use crate::error::MessageError;

/// Ordered header store with a lower-cased index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), index: HashMap::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns all values of the header, or an empty slice when it is absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.index.get(&name.to_ascii_lowercase()).map_or(&[][..], |&i| self.entries[i].1.as_slice())
    }

    /// Returns the canonical (first inserted) spelling of the header name.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.index.get(&name.to_ascii_lowercase()).map(|&i| self.entries[i].0.as_str())
    }

    /// Returns the values joined with `", "`, or an empty string when the header is absent.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// Iterates `(canonical name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Replaces all values of `name`.
    ///
    /// When the header already exists its canonical name and position are kept.
    pub fn set<V: AsRef<str>>(&mut self, name: &str, values: impl IntoIterator<Item = V>) -> Result<(), MessageError> {
        let values = validate_values(name, values)?;
        let key = validate_name(name)?;
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = values,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name.to_string(), values));
            }
        }
        Ok(())
    }

    /// Appends values under the existing canonical name, or inserts the header when absent.
    pub fn append<V: AsRef<str>>(&mut self, name: &str, values: impl IntoIterator<Item = V>) -> Result<(), MessageError> {
        let values = validate_values(name, values)?;
        let key = validate_name(name)?;
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1.extend(values),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name.to_string(), values));
            }
        }
        Ok(())
    }

    /// Removes the header, returning its values if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let i = self.index.remove(&name.to_ascii_lowercase())?;
        let (_, values) = self.entries.remove(i);
        for position in self.index.values_mut() {
            if *position > i {
                *position -= 1;
            }
        }
        Some(values)
    }

    /// Moves the header to the front, keeping the relative order of the rest.
    pub(crate) fn move_to_front(&mut self, name: &str) {
        let Some(&i) = self.index.get(&name.to_ascii_lowercase()) else {
            return;
        };
        let entry = self.entries.remove(i);
        self.entries.insert(0, entry);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self.entries.iter().enumerate().map(|(i, (name, _))| (name.to_ascii_lowercase(), i)).collect();
    }

    /// Converts into an [`http::HeaderMap`], losing the canonical name case.
    pub fn to_header_map(&self) -> Result<http::HeaderMap, MessageError> {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, values) in &self.entries {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| MessageError::invalid_header_value(name, e))?;
            for value in values {
                let header_value =
                    HeaderValue::from_bytes(value.as_bytes()).map_err(|e| MessageError::invalid_header_value(name, e))?;
                map.append(header_name.clone(), header_value);
            }
        }
        Ok(map)
    }
}

impl TryFrom<&http::HeaderMap> for Headers {
    type Error = MessageError;

    fn try_from(map: &http::HeaderMap) -> Result<Self, Self::Error> {
        let mut headers = Headers::with_capacity(map.keys_len());
        for (name, value) in map {
            let value = value.to_str().map_err(|e| MessageError::invalid_header_value(name, e))?;
            headers.append(name.as_str(), [value])?;
        }
        Ok(headers)
    }
}

/// Validates a header name as an RFC 7230 token and returns its lookup key.
fn validate_name(name: &str) -> Result<String, MessageError> {
    ensure!(HeaderName::from_bytes(name.as_bytes()).is_ok(), MessageError::invalid_header_name(name));
    Ok(name.to_ascii_lowercase())
}

fn validate_values<V: AsRef<str>>(name: &str, values: impl IntoIterator<Item = V>) -> Result<Vec<String>, MessageError> {
    let values = values
        .into_iter()
        .map(|value| {
            let value = value.as_ref();
            HeaderValue::from_bytes(value.as_bytes())
                .map(|_| value.to_string())
                .map_err(|e| MessageError::invalid_header_value(name, e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ensure!(!values.is_empty(), MessageError::invalid_header_value(name, "at least one value is required"));
    Ok(values)
}
