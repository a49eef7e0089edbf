//! Canonical request building for AWS Signature V4.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::fmt;

/// Characters that should NOT be percent-encoded in URI paths.
const URI_PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Characters that should NOT be percent-encoded in query strings.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode an object key or path, keeping `/` and encoding space as `%20`.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, URI_PATH_SET).to_string()
}

/// Percent-encode a query key or value.
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_SET).to_string()
}

/// Flat, multi-valued query parameter set.
///
/// Insertion order is kept; the canonical form sorts on demand. A parameter
/// pushed without a value is emitted as a bare key, while an empty string
/// value still emits `key=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, Option<String>)>,
}

impl QueryParams {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.params.push((key.into(), Some(value.to_string())));
        self
    }

    /// Append a bare `key` with no value.
    pub fn push_flag(&mut self, key: impl Into<String>) -> &mut Self {
        self.params.push((key.into(), None));
        self
    }

    /// Append `key=value` when a value is present.
    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// Builder-style [`push_flag`](Self::push_flag).
    pub fn with_flag(mut self, key: impl Into<String>) -> Self {
        self.push_flag(key);
        self
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Look up the first value for a key.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Build the canonical query string.
    ///
    /// Keys and values are encoded, then sorted by encoded key and encoded
    /// value (byte-wise) and joined with `&`.
    pub fn to_canonical_string(&self) -> String {
        let mut encoded: Vec<(String, Option<String>)> = self
            .params
            .iter()
            .map(|(k, v)| {
                (
                    encode_query_component(k),
                    v.as_deref().map(encode_query_component),
                )
            })
            .collect();

        encoded.sort();

        encoded
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{}={}", k, v),
                None => k.clone(),
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// Build the canonical headers block.
///
/// Names are lowercased and sorted; values are trimmed with inner runs of
/// whitespace collapsed. Repeated names are comma-joined. Every line,
/// including the last, ends in `\n`.
pub fn build_canonical_headers(headers: &[(String, String)]) -> String {
    collect_headers(headers)
        .iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

/// Build the signed headers string: sorted lowercase names joined with `;`.
pub fn build_signed_headers(headers: &[(String, String)]) -> String {
    collect_headers(headers)
        .into_keys()
        .collect::<Vec<_>>()
        .join(";")
}

fn collect_headers(headers: &[(String, String)]) -> BTreeMap<String, Vec<String>> {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in headers {
        let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        header_map
            .entry(name.trim().to_lowercase())
            .or_default()
            .push(trimmed);
    }

    header_map
}

/// Canonical form of one request, the input to the string-to-sign.
///
/// Purely derived from its inputs; rendering it with `Display` yields the six
/// newline-joined fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Uppercase HTTP method.
    pub method: String,
    /// Already-encoded absolute path.
    pub path: String,
    /// Canonical query string.
    pub query: String,
    /// Canonical headers block.
    pub headers: String,
    /// Signed header names.
    pub signed_headers: String,
    /// Hex payload digest or `UNSIGNED-PAYLOAD`.
    pub payload_hash: String,
}

impl CanonicalRequest {
    /// Build a canonical request.
    ///
    /// `path` must already be percent-encoded (see [`encode_key`]); it is used
    /// verbatim apart from defaulting an empty path to `/`.
    pub fn new(
        method: &str,
        path: &str,
        query: &QueryParams,
        headers: &[(String, String)],
        payload_hash: &str,
    ) -> Self {
        let path = if path.is_empty() {
            "/".to_string()
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Self {
            method: method.to_uppercase(),
            path,
            query: query.to_canonical_string(),
            headers: build_canonical_headers(headers),
            signed_headers: build_signed_headers(headers),
            payload_hash: payload_hash.to_string(),
        }
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method, self.path, self.query, self.headers, self.signed_headers, self.payload_hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("my file.txt"), "my%20file.txt");
        assert_eq!(
            encode_key("folder/subfolder/file.txt"),
            "folder/subfolder/file.txt"
        );
        assert_eq!(encode_key("a+b=c&d"), "a%2Bb%3Dc%26d");
        assert_eq!(encode_key("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn test_encode_query_component() {
        assert_eq!(encode_query_component("foo"), "foo");
        assert_eq!(encode_query_component("foo bar"), "foo%20bar");
        assert_eq!(encode_query_component("a/b"), "a%2Fb");
        assert_eq!(encode_query_component("-_.~"), "-_.~");
    }

    #[test]
    fn test_canonical_query_sorted() {
        let query = QueryParams::new()
            .with("prefix", "test")
            .with("delimiter", "/")
            .with("max_keys", 100);
        assert_eq!(
            query.to_canonical_string(),
            "delimiter=%2F&max_keys=100&prefix=test"
        );
    }

    #[test]
    fn test_canonical_query_flags_and_empty_values() {
        let query = QueryParams::new().with_flag("uploads").with("prefix", "");
        assert_eq!(query.to_canonical_string(), "prefix=&uploads");
    }

    #[test]
    fn test_canonical_query_repeated_keys() {
        let query = QueryParams::new().with("a", "2").with("a", "1").with("b", "x y");
        assert_eq!(query.to_canonical_string(), "a=1&a=2&b=x%20y");
    }

    #[test]
    fn test_push_opt_skips_none() {
        let mut query = QueryParams::new();
        query.push_opt("max-parts", Some(10)).push_opt("part-number-marker", None::<u32>);
        assert_eq!(query.len(), 1);
        assert_eq!(query.get("max-parts"), Some(Some("10")));
    }

    #[test]
    fn test_build_canonical_headers() {
        let headers = vec![
            ("X-Amz-Date".to_string(), "20231215T103045Z".to_string()),
            ("Host".to_string(), "  example.com  ".to_string()),
            ("X-Amz-Meta-Test".to_string(), "value  with   spaces".to_string()),
        ];

        assert_eq!(
            build_canonical_headers(&headers),
            "host:example.com\nx-amz-date:20231215T103045Z\nx-amz-meta-test:value with spaces\n"
        );
        assert_eq!(build_signed_headers(&headers), "host;x-amz-date;x-amz-meta-test");
    }

    #[test]
    fn test_canonical_request_layout() {
        let headers = vec![
            ("Host".to_string(), "examplebucket.s3.amazonaws.com".to_string()),
            ("x-amz-date".to_string(), "20130524T000000Z".to_string()),
        ];
        let canonical = CanonicalRequest::new(
            "get",
            "/test.txt",
            &QueryParams::new(),
            &headers,
            "UNSIGNED-PAYLOAD",
        );

        assert_eq!(
            canonical.to_string(),
            "GET\n/test.txt\n\nhost:examplebucket.s3.amazonaws.com\nx-amz-date:20130524T000000Z\n\nhost;x-amz-date\nUNSIGNED-PAYLOAD"
        );
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        let canonical = CanonicalRequest::new("GET", "", &QueryParams::new(), &[], "x");
        assert_eq!(canonical.path, "/");
    }
}
