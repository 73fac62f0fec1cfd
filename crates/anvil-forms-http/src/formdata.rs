//! Submitted form data.
//!
//! [`FormData`] is a multi-value dictionary over the fields of one
//! submission, parsed from an `application/x-www-form-urlencoded` body.
//! Repeated keys accumulate; `get` returns the last value.

use std::collections::BTreeMap;

/// A multi-value dictionary of submitted field values.
///
/// # Examples
///
/// ```
/// use anvil_forms_http::FormData;
///
/// let data = FormData::parse("color=red&color=blue&size=large");
/// assert_eq!(data.get("color"), Some("blue"));
/// assert_eq!(data.get_list("color"), Some(&vec!["red".to_string(), "blue".to_string()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    values: BTreeMap<String, Vec<String>>,
}

impl FormData {
    /// Creates a new empty `FormData`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a url-encoded body (e.g. `"name=Alice&age=30"`).
    ///
    /// Handles percent-encoding and `+`-as-space, and supports multiple
    /// values per key.
    pub fn parse(body: &str) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for pair in body.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq| (&pair[..eq], &pair[eq + 1..]));
            values
                .entry(percent_decode(key))
                .or_default()
                .push(percent_decode(value));
        }

        Self { values }
    }

    /// Returns the last value for the given key, or `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key, or `None`.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.values.get(key)
    }

    /// Returns `true` if the given key was submitted.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Appends a value for the given key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Iterates over `(key, last value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(k, v)| {
            v.last().map(|last| (k.as_str(), last.as_str()))
        })
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no fields were submitted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Decodes a percent-encoded component, treating `+` as a space.
///
/// Invalid escape sequences pass through unchanged.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if let (Some(hi), Some(lo)) = (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
