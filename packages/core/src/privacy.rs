//! Contact redaction before rendering.
//!
//! # Visibility model
//!
//! With [`RedactionPolicy::Standard`], the first matching rule wins:
//! - End-user applications show `foaf:mbox` as-is.
//! - Authenticated agents see `foaf:mbox` as-is.
//! - Everyone else (anonymous viewers of admin applications) gets
//!   `foaf:mbox_sha1sum` with the digest of the mailbox instead.
//!
//! Filtering never touches the input graph. When no redaction applies the
//! input is handed back borrowed, without a copy.

use std::borrow::Cow;
use std::sync::Arc;

use crate::digest::{ContactDigest, Sha1Digest};
use crate::graph::Graph;
use crate::types::{vocab, Term, Triple};
use crate::viewer::{ApplicationMode, Viewer};

/// Which redaction rules apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedactionPolicy {
    /// Hide contact values from anonymous viewers of admin applications.
    #[default]
    Standard,
    /// Never redact.
    Disabled,
}

impl std::str::FromStr for RedactionPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(RedactionPolicy::Standard),
            "disabled" => Ok(RedactionPolicy::Disabled),
            _ => Err(format!(
                "unknown redaction policy {:?}; expected one of: standard, disabled",
                s
            )),
        }
    }
}

/// Replaces identifying contact statements with their digests.
#[derive(Clone)]
pub struct PrivacyFilter {
    policy: RedactionPolicy,
    digest: Arc<dyn ContactDigest>,
    contact: String,
    digested: String,
}

impl PrivacyFilter {
    /// A filter for `foaf:mbox` → `foaf:mbox_sha1sum` using `digest`.
    pub fn new(digest: Arc<dyn ContactDigest>) -> Self {
        Self {
            policy: RedactionPolicy::default(),
            digest,
            contact: vocab::FOAF_MBOX.to_string(),
            digested: vocab::FOAF_MBOX_SHA1SUM.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: RedactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Redact `contact` statements into `digested` statements instead of the
    /// FOAF mailbox pair.
    pub fn with_predicates(mut self, contact: impl Into<String>, digested: impl Into<String>) -> Self {
        self.contact = contact.into();
        self.digested = digested.into();
        self
    }

    pub fn policy(&self) -> RedactionPolicy {
        self.policy
    }

    /// Whether a request from `viewer` in `mode` gets a redacted graph.
    pub fn applies(&self, viewer: &Viewer, mode: ApplicationMode) -> bool {
        match self.policy {
            RedactionPolicy::Disabled => false,
            RedactionPolicy::Standard => {
                if mode == ApplicationMode::EndUser {
                    return false;
                }
                !viewer.is_authenticated()
            }
        }
    }

    /// Return the graph `viewer` is allowed to see.
    pub fn filter<'g>(&self, graph: &'g Graph, viewer: &Viewer, mode: ApplicationMode) -> Cow<'g, Graph> {
        if !self.applies(viewer, mode) {
            return Cow::Borrowed(graph);
        }
        Cow::Owned(self.redact(graph))
    }

    fn redact(&self, graph: &Graph) -> Graph {
        let mut redacted = 0usize;
        let out: Graph = graph
            .iter()
            .map(|t| match self.redact_triple(t) {
                Some(replacement) => {
                    redacted += 1;
                    replacement
                }
                None => t.clone(),
            })
            .collect();

        if redacted > 0 {
            tracing::debug!(redacted, predicate = %self.contact, "replaced contact statements with digests");
        }
        out
    }

    // Blank-node objects carry no contact value and are kept as they are.
    fn redact_triple(&self, triple: &Triple) -> Option<Triple> {
        if !triple.has_predicate(&self.contact) {
            return None;
        }
        match &triple.object {
            Term::Iri { .. } | Term::Literal { .. } => {
                let hash = self.digest.digest_hex(triple.object.lexical_form().as_bytes());
                Some(Triple::new(
                    triple.subject.clone(),
                    Term::iri(self.digested.as_str()),
                    Term::literal(hash),
                ))
            }
            Term::Blank { .. } => None,
        }
    }
}

impl Default for PrivacyFilter {
    fn default() -> Self {
        Self::new(Arc::new(Sha1Digest))
    }
}

impl std::fmt::Debug for PrivacyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivacyFilter")
            .field("policy", &self.policy)
            .field("contact", &self.contact)
            .field("digested", &self.digested)
            .finish_non_exhaustive()
    }
}

// --- tests -------------------------------------------------------------------
