//! Core data types for RDF statements.
//!
//! This module defines [`Term`] and [`Triple`], the building blocks of a
//! [`Graph`](crate::Graph), plus the [`vocab`] constants the renderer relies
//! on. Both types serialise to and from JSON so graphs can be exchanged with
//! the CLI and with tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known namespace and property IRIs.
pub mod vocab {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
    pub const DCT: &str = "http://purl.org/dc/terms/";
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    pub const SCHEMA: &str = "http://schema.org/";
    pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
    pub const SIOC: &str = "http://rdfs.org/sioc/ns#";
    pub const ACL: &str = "http://www.w3.org/ns/auth/acl#";
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

    /// `foaf:mbox`, the identifying contact property.
    pub const FOAF_MBOX: &str = "http://xmlns.com/foaf/0.1/mbox";
    /// `foaf:mbox_sha1sum`, the digested form of `foaf:mbox`.
    pub const FOAF_MBOX_SHA1SUM: &str = "http://xmlns.com/foaf/0.1/mbox_sha1sum";
}

/// A node or value in an RDF statement.
///
/// Serialises with a `type` tag, e.g. `{"type":"iri","value":"http://…"}`.
/// IRIs are stored verbatim and are not validated on construction. Input
/// echoed from forms may legitimately carry malformed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    /// A resource identifier.
    Iri { value: String },
    /// A blank node, identified by a graph-local label (without `_:`).
    Blank { id: String },
    /// A literal value with an optional datatype IRI or language tag.
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri { value: value.into() }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::Blank { id: id.into() }
    }

    /// A plain (`xsd:string`) literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            lang: Some(lang.into()),
        }
    }

    /// The canonical string form: IRI text, blank-node label, or the
    /// literal's lexical form.
    pub fn lexical_form(&self) -> &str {
        match self {
            Term::Iri { value } => value,
            Term::Blank { id } => id,
            Term::Literal { value, .. } => value,
        }
    }

    /// Returns the IRI text if this term is an IRI.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }
}

/// Formats the term in N-Triples notation. Intended for logs and error
/// messages; no escaping is applied.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri { value } => write!(f, "<{}>", value),
            Term::Blank { id } => write!(f, "_:{}", id),
            Term::Literal {
                value,
                datatype,
                lang,
            } => {
                write!(f, "\"{}\"", value)?;
                if let Some(lang) = lang {
                    write!(f, "@{}", lang)
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single `(subject, predicate, object)` statement.
///
/// Field order matters: the derived `Ord` sorts by subject first, which the
/// serializer relies on to group statements per resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// True when the predicate is the IRI `iri`.
    pub fn has_predicate(&self, iri: &str) -> bool {
        self.predicate.as_iri() == Some(iri)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

// --- tests -------------------------------------------------------------------
