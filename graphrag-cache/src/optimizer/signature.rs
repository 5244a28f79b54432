//! Cheap request signatures used as cache keys
//!
//! A signature is built from fields that can be read in constant time: the type
//! tag, the entity source, list lengths, the query length and a short query
//! prefix. List contents (entity ids, embedded vectors) are never hashed.
//!
//! Components are written as `label=value` when present and `label-` when
//! absent, separated by `|`. Structural characters inside values are
//! backslash-escaped, so no field content can imitate a component boundary.

use crate::error::Result;
use crate::optimizer::classifier::{char_prefix, ClassifierRules, DetectionInputs};
use crate::request::{
    QueryRequest, ENTITY_IDS_FIELD, ENTITY_SOURCES_FIELD, ENTITY_SOURCE_FIELD, QUERY_FIELD,
    TYPE_FIELD,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of query text carried by a fingerprint-flow signature
pub const QUERY_PREFIX_CHARS: usize = 64;

const SEPARATOR: char = '|';

/// Pre-filter key for the fingerprint cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key for the graph-type cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionSignature(String);

impl DetectionSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetectionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates signature components
#[derive(Debug, Default)]
struct SignatureBuilder {
    buf: String,
}

impl SignatureBuilder {
    fn component(mut self, label: &str, value: Option<&str>) -> Self {
        if !self.buf.is_empty() {
            self.buf.push(SEPARATOR);
        }
        self.buf.push_str(label);

        match value {
            Some(value) => {
                self.buf.push('=');
                push_escaped(&mut self.buf, value);
            }
            None => self.buf.push('-'),
        }
        self
    }

    fn len_component(self, label: &str, len: Option<usize>) -> Self {
        let len = len.map(|n| n.to_string());
        self.component(label, len.as_deref())
    }

    fn list_component<'a>(mut self, label: &str, items: impl IntoIterator<Item = &'a str>) -> Self {
        if !self.buf.is_empty() {
            self.buf.push(SEPARATOR);
        }
        self.buf.push_str(label);
        self.buf.push('[');
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            push_escaped(&mut self.buf, item);
        }
        self.buf.push(']');
        self
    }

    fn build(self) -> String {
        self.buf
    }
}

fn push_escaped(buf: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | '|' | ',' | '[' | ']') {
            buf.push('\\');
        }
        buf.push(c);
    }
}

/// Build the fingerprint-flow signature of a request
///
/// Fails only when one of the inspected fields is malformed.
pub fn build_signature(request: &QueryRequest<'_>) -> Result<Signature> {
    let type_tag = request.type_tag().require_well_formed(TYPE_FIELD)?;
    let entity_source = request.entity_source().require_well_formed(ENTITY_SOURCE_FIELD)?;
    let entity_sources = request.entity_sources().require_well_formed(ENTITY_SOURCES_FIELD)?;
    let entity_ids = request.entity_ids().require_well_formed(ENTITY_IDS_FIELD)?;
    let query = request.query().require_well_formed(QUERY_FIELD)?;

    let key = SignatureBuilder::default()
        .component("t", type_tag)
        .component("s", entity_source)
        .len_component("ss", entity_sources.map(|items| items.len()))
        .len_component("ids", entity_ids.map(|items| items.len()))
        .len_component("ql", query.map(str::len))
        .component("q", query.map(|q| char_prefix(q, QUERY_PREFIX_CHARS)))
        .build();

    Ok(Signature(key))
}

/// Build the classifier-flow signature of a request
///
/// The key encodes exactly the [`DetectionInputs`] the classifier reads.
pub fn build_detection_signature(
    request: &QueryRequest<'_>,
    rules: &ClassifierRules,
) -> Result<DetectionSignature> {
    request.type_tag().require_well_formed(TYPE_FIELD)?;
    request.entity_source().require_well_formed(ENTITY_SOURCE_FIELD)?;
    request.entity_sources().require_well_formed(ENTITY_SOURCES_FIELD)?;
    request.entity_ids().require_well_formed(ENTITY_IDS_FIELD)?;
    request.query().require_well_formed(QUERY_FIELD)?;

    let inputs = DetectionInputs::extract(request, rules);
    let id_lens: Vec<String> = inputs.ids.iter().map(|id| id.len.to_string()).collect();

    let key = SignatureBuilder::default()
        .component("t", inputs.type_tag)
        .list_component("src", inputs.sources.iter().copied())
        .list_component("idp", inputs.ids.iter().map(|id| id.prefix))
        .list_component("idl", id_lens.iter().map(String::as_str))
        .component("q", inputs.query_prefix.as_deref())
        .build();

    Ok(DetectionSignature(key))
}
