//! Fingerprint cache entries

use crate::optimizer::fingerprint::{CanonicalForm, Fingerprint};
use serde::{Deserialize, Serialize};

/// Value stored in the fingerprint cache
///
/// When hit verification is on, the canonical encoding of the request is kept
/// next to the fingerprint. A signature hit is only served if the incoming
/// request encodes to the same bytes, which covers every field the fingerprint
/// reads, not just the ones the signature looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFingerprint {
    pub fingerprint: Fingerprint,

    /// Canonical encoding of the request that produced the entry
    pub form: Option<CanonicalForm>,
}

impl CachedFingerprint {
    /// Entry that is returned on any signature hit
    pub fn unverified(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            form: None,
        }
    }

    /// Entry that remembers the encoding it was computed from
    pub fn verified(fingerprint: Fingerprint, form: CanonicalForm) -> Self {
        Self {
            fingerprint,
            form: Some(form),
        }
    }

    pub fn is_verifiable(&self) -> bool {
        self.form.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::fingerprint::FingerprintComputer;
    use crate::request::QueryRequest;
    use serde_json::json;

    #[test]
    fn test_verified_entry_keeps_form() {
        let value = json!({ "query": "find entity X" });
        let request = QueryRequest::from_value(&value).unwrap();
        let computer = FingerprintComputer::default();
        let (fingerprint, form) = computer.compute_with_form(&request);

        let entry = CachedFingerprint::verified(fingerprint.clone(), form);
        assert!(entry.is_verifiable());
        assert_eq!(entry.fingerprint, fingerprint);
        assert!(computer.matches(&request, entry.form.as_ref().unwrap()));
    }

    #[test]
    fn test_unverified_entry_has_no_form() {
        let value = json!({ "query": "find entity X" });
        let fingerprint = FingerprintComputer::default().compute(&QueryRequest::from_value(&value).unwrap());

        let entry = CachedFingerprint::unverified(fingerprint);
        assert!(!entry.is_verifiable());
        assert_eq!(entry.form, None);
    }
}
