use multimap::MultiMap;
use url::form_urlencoded;

/// Builder for URL query strings.
///
/// Keys are emitted in sorted order so that two queries built from the same
/// parameters always render the same string, regardless of insertion order.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    params: MultiMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Repeated keys are kept and emitted in insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add a parameter only when the value is present.
    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as a query string with a leading `?`, or an empty string when
    /// no parameters are set.
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let mut keys: Vec<&String> = self.params.keys().collect();
        keys.sort();

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for key in keys {
            if let Some(values) = self.params.get_vec(key) {
                for value in values {
                    serializer.append_pair(key, value);
                }
            }
        }
        format!("?{}", serializer.finish())
    }
}
