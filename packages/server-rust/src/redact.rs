//! Path-addressed redaction of request parameters.
//!
//! Each blacklist entry is a dotted path (`"data.array"`) walked left to right
//! through nested objects. The value at the last segment is replaced by the
//! redaction string; if that value is itself an object, each of its direct
//! values is replaced instead (one level only). Paths that run into a missing
//! key or a non-object value are ignored. Trailing empty segments are dropped
//! (`"a."` is `"a"`), and an entry with no segments left matches nothing.

use serde_json::Value;

/// Default replacement for redacted values.
pub const DEFAULT_REDACTED_STRING: &str = "REDACTED";

/// Applies a fixed blacklist to request bodies.
///
/// Holds only the parsed paths, so one instance is shared by all concurrent calls.
#[derive(Debug, Clone)]
pub struct Redactor {
    paths: Vec<Vec<String>>,
    replacement: String,
}

impl Redactor {
    /// Parses each blacklist entry into its path segments.
    pub fn new<I, S>(blacklist: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = blacklist
            .into_iter()
            .filter_map(|entry| parse_path(entry.as_ref()))
            .collect();
        Self {
            paths,
            replacement: replacement.into(),
        }
    }

    /// Whether no usable path was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns a redacted copy of `params`. Non-object input comes back unchanged.
    #[must_use]
    pub fn sanitize(&self, params: &Value) -> Value {
        let mut sanitized = params.clone();
        if self.is_empty() || !sanitized.is_object() {
            return sanitized;
        }
        for path in &self.paths {
            redact_path(&mut sanitized, path, &self.replacement);
        }
        sanitized
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>(), DEFAULT_REDACTED_STRING)
    }
}

/// Splits a dotted entry, dropping trailing empty segments. `None` if nothing is left.
fn parse_path(entry: &str) -> Option<Vec<String>> {
    let mut segments: Vec<String> = entry.split('.').map(str::to_string).collect();
    while segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    (!segments.is_empty()).then_some(segments)
}

/// Walks `segments` from `root`, replacing the terminal value in place.
fn redact_path(root: &mut Value, segments: &[String], replacement: &str) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        current = match current.as_object_mut().and_then(|map| map.get_mut(segment)) {
            Some(next) => next,
            None => return,
        };
    }

    let Some(target) = current.as_object_mut().and_then(|map| map.get_mut(last)) else {
        return;
    };

    match target {
        Value::Object(children) => {
            for child in children.values_mut() {
                *child = Value::String(replacement.to_string());
            }
        }
        other => *other = Value::String(replacement.to_string()),
    }
}
