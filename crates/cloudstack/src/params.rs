//! Query-parameter marshaling for API commands.

use std::collections::BTreeMap;

/// The query parameters of a single API command.
///
/// CloudStack signs the lexicographically sorted parameter list, so the
/// backing map keeps keys ordered at all times.
#[derive(Debug, Default, Clone)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    pub fn set_i64(&mut self, key: &str, value: i64) {
        self.set(key, value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded `key=value` pairs joined with `&`, keys in sorted order.
    ///
    /// This is both the request query string and the exact byte sequence
    /// the signature is computed over (after lowercasing).
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_sorts_keys() {
        let mut p = QueryParams::new();
        p.set("response", "json");
        p.set("command", "listZones");
        p.set("apikey", "k");
        assert_eq!(p.encode(), "apikey=k&command=listZones&response=json");
    }

    #[test]
    fn encode_escapes_values() {
        let mut p = QueryParams::new();
        p.set("name", "a b/c");
        assert_eq!(p.encode(), "name=a%20b%2Fc");
    }

    #[test]
    fn typed_setters() {
        let mut p = QueryParams::new();
        p.set_bool("issourcenat", true);
        p.set_i64("page", 2);
        assert_eq!(p.get("issourcenat"), Some("true"));
        assert_eq!(p.get("page"), Some("2"));
    }

    #[test]
    fn set_overwrites() {
        let mut p = QueryParams::new();
        p.set("name", "first");
        p.set("name", "second");
        assert_eq!(p.get("name"), Some("second"));
        assert_eq!(p.iter().count(), 1);
    }
}
