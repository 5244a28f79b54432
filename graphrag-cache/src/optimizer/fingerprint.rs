//! Full request fingerprints
//!
//! The fingerprint is a SHA-256 digest of a canonical encoding of the whole
//! request, streamed straight from the borrowed JSON tree into the hasher.
//! Object keys are visited in sorted order, so key order in the source document
//! does not matter.
//!
//! Large arrays are not hashed element by element. An array longer than
//! [`FingerprintConfig::vector_hint_threshold`], or any array stored under one
//! of the configured vector keys, contributes only its length and the kind of
//! its first element. Two requests that differ only in the contents of such an
//! array therefore share a fingerprint.
//!
//! Numbers are written in one canonical form, so `1`, `1.0` and `1e0` hash
//! alike, as do `0.0` and `-0.0`.
//!
//! The same encoding can be recorded as a [`CanonicalForm`] and later checked
//! against another request without hashing it. The fingerprint cache uses this
//! to confirm that a signature hit really belongs to the incoming request.

use crate::request::QueryRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

const FINGERPRINT_PREFIX: &str = "fp:";

/// Stable hash of a normalized request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut s = String::with_capacity(FINGERPRINT_PREFIX.len() + digest.len() * 2);
        s.push_str(FINGERPRINT_PREFIX);
        for byte in digest {
            // Writing to a String cannot fail
            let _ = write!(s, "{:02x}", byte);
        }
        Fingerprint(s)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recorded canonical encoding of one request
///
/// Two requests have equal forms exactly when they have equal fingerprints
/// (up to SHA-256 collisions). Arrays replaced by shape hints stay small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalForm(Vec<u8>);

/// Normalization rules for fingerprinting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Arrays longer than this are replaced by a shape hint
    pub vector_hint_threshold: usize,

    /// Containers nested deeper than this are replaced by a depth hint
    pub max_depth: usize,

    /// Keys whose array values are always replaced by a shape hint
    pub vector_keys: Vec<String>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            vector_hint_threshold: 32,
            max_depth: 64,
            vector_keys: ["embedding", "embeddings", "vector", "vectors"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl FingerprintConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.vector_hint_threshold == 0 {
            return Err("vector_hint_threshold must be greater than 0".to_string());
        }

        if self.max_depth == 0 {
            return Err("max_depth must be greater than 0".to_string());
        }

        Ok(())
    }

    fn is_vector_key(&self, key: &str) -> bool {
        self.vector_keys.iter().any(|k| k == key)
    }
}

/// Computes [`Fingerprint`]s under a fixed [`FingerprintConfig`]
#[derive(Debug, Clone, Default)]
pub struct FingerprintComputer {
    config: FingerprintConfig,
}

impl FingerprintComputer {
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Fingerprint the whole request, recognized and unrecognized fields alike
    pub fn compute(&self, request: &QueryRequest<'_>) -> Fingerprint {
        let hasher = self.encode(request, Sha256::new());
        Fingerprint::from_digest(&hasher.finalize())
    }

    /// Fingerprint a request and keep its canonical encoding
    pub fn compute_with_form(&self, request: &QueryRequest<'_>) -> (Fingerprint, CanonicalForm) {
        let recording = self.encode(
            request,
            Recording {
                hasher: Sha256::new(),
                bytes: Vec::new(),
            },
        );
        (
            Fingerprint::from_digest(&recording.hasher.finalize()),
            CanonicalForm(recording.bytes),
        )
    }

    /// Whether `request` encodes to exactly `form`
    pub fn matches(&self, request: &QueryRequest<'_>, form: &CanonicalForm) -> bool {
        self.encode(
            request,
            Comparison {
                expected: &form.0,
                pos: 0,
                equal: true,
            },
        )
        .finish()
    }

    fn encode<S: CanonicalSink>(&self, request: &QueryRequest<'_>, sink: S) -> S {
        let mut encoder = CanonicalEncoder {
            sink,
            config: &self.config,
        };
        encoder.object(request.fields(), 0);
        encoder.sink
    }
}

/// Destination of canonical encoding bytes
trait CanonicalSink {
    fn write(&mut self, bytes: &[u8]);
}

impl CanonicalSink for Sha256 {
    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Hashes and records at once
struct Recording {
    hasher: Sha256,
    bytes: Vec<u8>,
}

impl CanonicalSink for Recording {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.bytes.extend_from_slice(bytes);
    }
}

/// Compares the encoding against a recorded one; stops looking after the first difference
struct Comparison<'e> {
    expected: &'e [u8],
    pos: usize,
    equal: bool,
}

impl Comparison<'_> {
    fn finish(self) -> bool {
        self.equal && self.pos == self.expected.len()
    }
}

impl CanonicalSink for Comparison<'_> {
    fn write(&mut self, bytes: &[u8]) {
        if !self.equal {
            return;
        }

        let end = self.pos + bytes.len();
        match self.expected.get(self.pos..end) {
            Some(expected) if expected == bytes => self.pos = end,
            _ => self.equal = false,
        }
    }
}

/// Streams the canonical encoding of a JSON tree into a sink
struct CanonicalEncoder<'c, S> {
    sink: S,
    config: &'c FingerprintConfig,
}

impl<S: CanonicalSink> CanonicalEncoder<'_, S> {
    fn tag(&mut self, tag: u8) {
        self.sink.write(&[tag]);
    }

    fn length(&mut self, len: usize) {
        self.sink.write(&(len as u64).to_le_bytes());
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.length(bytes.len());
        self.sink.write(bytes);
    }

    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.tag(b'n'),
            Value::Bool(true) => self.tag(b't'),
            Value::Bool(false) => self.tag(b'f'),
            Value::Number(n) => {
                self.tag(b'd');
                self.bytes(canonical_number(n).as_bytes());
            }
            Value::String(s) => {
                self.tag(b's');
                self.bytes(s.as_bytes());
            }
            Value::Array(items) => self.array(items, depth, false),
            Value::Object(fields) => self.object(fields, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize, vector_key: bool) {
        if vector_key || items.len() > self.config.vector_hint_threshold {
            self.shape_hint(items);
            return;
        }

        if depth >= self.config.max_depth {
            self.tag(b'x');
            self.tag(b'a');
            self.length(items.len());
            return;
        }

        self.tag(b'a');
        self.length(items.len());
        for item in items {
            self.value(item, depth + 1);
        }
    }

    fn object(&mut self, fields: &Map<String, Value>, depth: usize) {
        if depth >= self.config.max_depth {
            self.tag(b'x');
            self.tag(b'o');
            self.length(fields.len());
            return;
        }

        let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        self.tag(b'o');
        self.length(entries.len());
        for (key, value) in entries {
            self.bytes(key.as_bytes());
            match value {
                Value::Array(items) => {
                    let vector_key = self.config.is_vector_key(key);
                    self.array(items, depth + 1, vector_key);
                }
                other => self.value(other, depth + 1),
            }
        }
    }

    fn shape_hint(&mut self, items: &[Value]) {
        self.tag(b'h');
        self.length(items.len());
        self.tag(match items.first() {
            None => b'-',
            Some(Value::Null) => b'n',
            Some(Value::Bool(_)) => b'b',
            Some(Value::Number(_)) => b'd',
            Some(Value::String(_)) => b's',
            Some(Value::Array(_)) => b'a',
            Some(Value::Object(_)) => b'o',
        });
    }
}

/// Integers and integral floats share one text form
fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }

    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        // f64 Display prints integral values without a fraction or exponent
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fingerprint(value: &Value) -> Fingerprint {
        FingerprintComputer::default().compute(&QueryRequest::from_value(value).unwrap())
    }

    fn embedding(len: usize, seed: f64) -> Vec<f64> {
        (0..len).map(|i| seed + i as f64 * 0.001).collect()
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(&json!({ "query": "find entity X" }));
        let hex = fp.as_str().strip_prefix("fp:").unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp.to_string(), fp.as_str());
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let value = json!({
            "query": "find entity X",
            "type": "general",
            "filters": { "year": 2021, "court": ["federal", "state"] }
        });
        assert_eq!(fingerprint(&value), fingerprint(&value));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value =
            serde_json::from_str(r#"{"query": "x", "type": "ipld", "opts": {"a": 1, "b": 2}}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"opts": {"b": 2, "a": 1}, "type": "ipld", "query": "x"}"#)
                .unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_full_query_text_matters() {
        let prefix = "a".repeat(100);
        let a = fingerprint(&json!({ "query": format!("{}-one", prefix) }));
        let b = fingerprint(&json!({ "query": format!("{}-two", prefix) }));
        assert_ne!(a, b);
    }

    #[test]
    fn test_unrecognized_fields_matter() {
        let a = fingerprint(&json!({ "query": "x", "limit": 5 }));
        let b = fingerprint(&json!({ "query": "x", "limit": 6 }));
        assert_ne!(a, b);
    }

    #[test]
    fn test_kinds_are_distinguished() {
        let a = fingerprint(&json!({ "v": "1" }));
        let b = fingerprint(&json!({ "v": 1 }));
        let c = fingerprint(&json!({ "v": [1] }));
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_numbers_are_canonical() {
        assert_eq!(fingerprint(&json!({ "v": 1 })), fingerprint(&json!({ "v": 1.0 })));
        assert_eq!(fingerprint(&json!({ "v": 0.0 })), fingerprint(&json!({ "v": -0.0 })));
        assert_eq!(fingerprint(&json!({ "v": -3 })), fingerprint(&json!({ "v": -3.0 })));

        let parsed: Value = serde_json::from_str(r#"{"v": 1e2}"#).unwrap();
        assert_eq!(fingerprint(&parsed), fingerprint(&json!({ "v": 100 })));

        assert_ne!(fingerprint(&json!({ "v": 1 })), fingerprint(&json!({ "v": 1.5 })));
        assert_ne!(fingerprint(&json!({ "v": 1 })), fingerprint(&json!({ "v": "1" })));
    }

    #[test]
    fn test_form_matches_only_equal_encodings() {
        let computer = FingerprintComputer::default();
        let stored = json!({ "query": "find entity X", "limit": 5, "entity_ids": ["Q1", "Q2"] });
        let (fp, form) = computer.compute_with_form(&QueryRequest::from_value(&stored).unwrap());
        assert_eq!(fp, fingerprint(&stored));

        let reordered: Value = serde_json::from_str(
            r#"{"entity_ids": ["Q1", "Q2"], "limit": 5.0, "query": "find entity X"}"#,
        )
        .unwrap();
        assert!(computer.matches(&QueryRequest::from_value(&reordered).unwrap(), &form));

        for other in [
            json!({ "query": "find entity X", "limit": 500, "entity_ids": ["Q1", "Q2"] }),
            json!({ "query": "find entity X", "limit": 5, "entity_ids": ["Q1", "Q3"] }),
            json!({ "query": "find entity X", "limit": 5, "entity_ids": ["Q1", "Q2"], "x": null }),
            json!({ "query": "find entity X", "entity_ids": ["Q1", "Q2"] }),
        ] {
            assert!(!computer.matches(&QueryRequest::from_value(&other).unwrap(), &form));
        }
    }

    #[test]
    fn test_vector_keys_use_shape_hint() {
        let a = fingerprint(&json!({ "query": "x", "embedding": embedding(8, 0.1) }));
        let b = fingerprint(&json!({ "query": "x", "embedding": embedding(8, 0.9) }));
        let c = fingerprint(&json!({ "query": "x", "embedding": embedding(9, 0.1) }));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_long_arrays_use_shape_hint() {
        let a = fingerprint(&json!({ "entity_ids": (0..100).map(|i| format!("a{}", i)).collect::<Vec<_>>() }));
        let b = fingerprint(&json!({ "entity_ids": (0..100).map(|i| format!("b{}", i)).collect::<Vec<_>>() }));
        assert_eq!(a, b);

        let short_a = fingerprint(&json!({ "entity_ids": ["a1", "a2"] }));
        let short_b = fingerprint(&json!({ "entity_ids": ["b1", "b2"] }));
        assert_ne!(short_a, short_b);
    }

    #[test]
    fn test_nested_vectors_use_shape_hint() {
        let a = fingerprint(&json!({ "nodes": [{ "vector": embedding(4, 0.1) }] }));
        let b = fingerprint(&json!({ "nodes": [{ "vector": embedding(4, 0.5) }] }));
        assert_eq!(a, b);
    }

    #[test]
    fn test_depth_limit() {
        let mut deep = json!("leaf");
        for _ in 0..100 {
            deep = json!({ "next": deep });
        }
        let value = json!({ "query": "x", "deep": deep });
        assert_eq!(fingerprint(&value), fingerprint(&value));

        let computer = FingerprintComputer::new(FingerprintConfig {
            max_depth: 2,
            ..Default::default()
        });
        let a = json!({ "a": { "b": { "c": 1 } } });
        let b = json!({ "a": { "b": { "c": 2 } } });
        assert_eq!(
            computer.compute(&QueryRequest::from_value(&a).unwrap()),
            computer.compute(&QueryRequest::from_value(&b).unwrap())
        );
    }

    #[test]
    fn test_config_changes_fingerprint() {
        let value = json!({ "ids": ["a", "b", "c"] });
        let request = QueryRequest::from_value(&value).unwrap();

        let default = FingerprintComputer::default().compute(&request);
        let tight = FingerprintComputer::new(FingerprintConfig {
            vector_hint_threshold: 2,
            ..Default::default()
        })
        .compute(&request);
        assert_ne!(default, tight);
    }

    #[test]
    fn test_config_validation() {
        assert!(FingerprintConfig::default().validate().is_ok());

        let config = FingerprintConfig {
            vector_hint_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
