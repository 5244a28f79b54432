//! Heuristic graph-type classifier
//!
//! Assigns one of a closed set of [`GraphType`] labels to a request with an
//! ordered chain of cheap checks. The first check that produces a verdict wins:
//!
//! 1. explicit `type` tag
//! 2. entity source names
//! 3. keywords in a bounded prefix of the query text
//! 4. entity id prefixes (content identifiers vs. Wikidata ids)
//! 5. [`GraphType::General`]
//!
//! Every input the chain reads is captured by [`DetectionInputs`], which is
//! bounded regardless of how large the request is. The detection signature is
//! an encoding of the same struct, so two requests with equal signatures always
//! classify identically.

use crate::error::OptimizerError;
use crate::request::{leading_strings, QueryRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Ids longer than this are matched on their first `ID_PREFIX_CHARS` characters
pub const ID_PREFIX_CHARS: usize = 64;

/// Length of a base58 CIDv0 (`Qm...`)
const CID_V0_LEN: usize = 46;

const CID_V1_PREFIXES: &[&str] = &["bafy", "bafk", "bafz", "bagu", "bagq"];
const CONTENT_URI_PREFIXES: &[&str] = &["ipfs://", "ipld://", "ipns://", "/ipfs/", "/ipns/"];
const WIKI_HOSTS: &[&str] = &["wikipedia.org", "wikidata.org"];

/// Closed set of graph categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    /// Wikipedia / Wikidata knowledge graph
    Wikipedia,

    /// Content-addressed IPLD graph
    Ipld,

    /// Both families present
    Mixed,

    /// No recognizable signal
    General,
}

impl GraphType {
    pub const ALL: [GraphType; 4] = [
        GraphType::Wikipedia,
        GraphType::Ipld,
        GraphType::Mixed,
        GraphType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::Wikipedia => "wikipedia",
            GraphType::Ipld => "ipld",
            GraphType::Mixed => "mixed",
            GraphType::General => "general",
        }
    }
}

impl Default for GraphType {
    fn default() -> Self {
        GraphType::General
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphType::ALL
            .iter()
            .copied()
            .find(|graph_type| s.trim().eq_ignore_ascii_case(graph_type.as_str()))
            .ok_or_else(|| OptimizerError::Other(format!("unknown graph type: {}", s)))
    }
}

/// Keyword tables and scan bounds for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRules {
    /// Tokens that indicate a Wikipedia/Wikidata graph
    pub wikipedia_keywords: Vec<String>,

    /// Tokens that indicate an IPLD graph
    pub ipld_keywords: Vec<String>,

    /// Characters of query text inspected for keywords
    pub query_prefix_chars: usize,

    /// Items of each list field inspected
    pub list_scan_limit: usize,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            wikipedia_keywords: ["wikipedia", "wikidata", "dbpedia", "wiki"]
                .into_iter()
                .map(String::from)
                .collect(),
            ipld_keywords: ["ipld", "ipfs", "ipns", "cid", "multihash"]
                .into_iter()
                .map(String::from)
                .collect(),
            query_prefix_chars: 128,
            list_scan_limit: 8,
        }
    }
}

impl ClassifierRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.query_prefix_chars == 0 {
            return Err("query_prefix_chars must be greater than 0".to_string());
        }

        if self.list_scan_limit == 0 {
            return Err("list_scan_limit must be greater than 0".to_string());
        }

        Ok(())
    }

    fn keyword_family(&self, token: &str) -> Family {
        Family {
            wikipedia: self
                .wikipedia_keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(token)),
            ipld: self
                .ipld_keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(token)),
        }
    }

    fn text_family(&self, text: &str) -> Family {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .fold(Family::default(), |acc, token| acc.merge(self.keyword_family(token)))
    }
}

/// Which families a check has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Family {
    wikipedia: bool,
    ipld: bool,
}

impl Family {
    fn merge(self, other: Family) -> Family {
        Family {
            wikipedia: self.wikipedia || other.wikipedia,
            ipld: self.ipld || other.ipld,
        }
    }

    fn verdict(self) -> Option<GraphType> {
        match (self.wikipedia, self.ipld) {
            (true, true) => Some(GraphType::Mixed),
            (true, false) => Some(GraphType::Wikipedia),
            (false, true) => Some(GraphType::Ipld),
            (false, false) => None,
        }
    }
}

/// Prefix of `s` holding at most `max_chars` characters
pub(crate) fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// One entity id: leading characters plus the full byte length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPrefix<'a> {
    pub prefix: &'a str,
    pub len: usize,
}

/// The bounded slice of a request that classification depends on
///
/// Malformed fields are read as absent, so extraction never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionInputs<'a> {
    pub type_tag: Option<&'a str>,
    pub sources: Vec<&'a str>,
    pub query_prefix: Option<String>,
    pub ids: Vec<IdPrefix<'a>>,
}

impl<'a> DetectionInputs<'a> {
    pub fn extract(request: &QueryRequest<'a>, rules: &ClassifierRules) -> Self {
        let limit = rules.list_scan_limit;

        let sources = request
            .entity_source()
            .present()
            .into_iter()
            .chain(
                request
                    .entity_sources()
                    .present()
                    .into_iter()
                    .flat_map(move |items| leading_strings(items, limit)),
            )
            .take(limit)
            .map(|name| char_prefix(name, ID_PREFIX_CHARS))
            .collect();

        let query_prefix = request
            .query()
            .present()
            .map(|q| char_prefix(q, rules.query_prefix_chars).to_lowercase());

        let ids = request
            .entity_ids()
            .present()
            .map(|items| {
                leading_strings(items, limit)
                    .map(|id| IdPrefix {
                        prefix: char_prefix(id, ID_PREFIX_CHARS),
                        len: id.len(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            type_tag: request.type_tag().present(),
            sources,
            query_prefix,
            ids,
        }
    }
}

/// Ordered, short-circuiting rule chain
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    rules: ClassifierRules,
}

impl HeuristicClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify a request; always yields a member of the closed set
    pub fn classify(&self, request: &QueryRequest<'_>) -> GraphType {
        self.classify_inputs(&DetectionInputs::extract(request, &self.rules))
    }

    pub fn classify_inputs(&self, inputs: &DetectionInputs<'_>) -> GraphType {
        if let Some(tag) = inputs.type_tag {
            match tag.parse::<GraphType>() {
                Ok(graph_type) => return graph_type,
                Err(_) => debug!("Ignoring unknown explicit graph type: {}", tag),
            }
        }

        if let Some(graph_type) = self.from_sources(&inputs.sources) {
            return graph_type;
        }

        if let Some(graph_type) = inputs
            .query_prefix
            .as_deref()
            .and_then(|prefix| self.rules.text_family(prefix).verdict())
        {
            return graph_type;
        }

        if let Some(graph_type) = Self::from_ids(&inputs.ids) {
            return graph_type;
        }

        GraphType::General
    }

    fn from_sources(&self, sources: &[&str]) -> Option<GraphType> {
        sources
            .iter()
            .fold(Family::default(), |acc, name| acc.merge(self.rules.text_family(name)))
            .verdict()
    }

    fn from_ids(ids: &[IdPrefix<'_>]) -> Option<GraphType> {
        ids.iter()
            .fold(Family::default(), |acc, id| {
                acc.merge(Family {
                    wikipedia: is_wikidata_id(id),
                    ipld: is_content_id(id),
                })
            })
            .verdict()
    }
}

fn is_content_id(id: &IdPrefix<'_>) -> bool {
    let prefix = id.prefix;

    if CID_V1_PREFIXES
        .iter()
        .chain(CONTENT_URI_PREFIXES)
        .any(|p| {
            prefix
                .get(..p.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(p))
        })
    {
        return true;
    }

    id.len == CID_V0_LEN && prefix.starts_with("Qm") && prefix.chars().all(is_base58)
}

fn is_wikidata_id(id: &IdPrefix<'_>) -> bool {
    let prefix = id.prefix;

    let mut chars = prefix.chars();
    let entity_id = matches!(chars.next(), Some('Q' | 'P' | 'L'))
        && prefix.len() == id.len
        && prefix.len() > 1
        && chars.all(|c| c.is_ascii_digit());

    entity_id || WIKI_HOSTS.iter().any(|host| prefix.contains(host))
}

fn is_base58(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}
