//! Plain RDF/XML serialization of a [`Graph`].
//!
//! The output is the flat form: one `rdf:Description` per subject, no nested
//! descriptions, no abbreviations. It is deterministic for a given graph so
//! the stylesheet always sees the same input for the same statements.
//!
//! Malformed IRIs are emitted as-is in permissive mode, which is the default.
//! [`RdfXmlSerializer::strict`] rejects them.

use std::collections::HashMap;
use std::sync::LazyLock;

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use thiserror::Error;

use crate::graph::Graph;
use crate::types::{vocab, Term, Triple};

/// Errors that make a graph impossible to encode as RDF/XML.
#[derive(Debug, Error, PartialEq)]
pub enum SerializationError {
    #[error("{position} cannot be {term}; RDF/XML needs IRI or blank-node subjects and IRI predicates")]
    UnsupportedTerm { position: &'static str, term: String },

    #[error("predicate <{0}> has no XML local-name suffix and cannot be written as RDF/XML")]
    UnsplittablePredicate(String),

    #[error("malformed IRI {0:?}")]
    InvalidIri(String),

    #[error("character U+{code:04X} cannot be represented in XML 1.0 (in {value:?})")]
    IllegalCharacter { code: u32, value: String },

    #[error("XML writer failed: {0}")]
    Xml(String),
}

/// Conventional prefixes for namespaces that show up often in application data.
const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", vocab::RDF),
    ("rdfs", vocab::RDFS),
    ("xsd", vocab::XSD),
    ("owl", vocab::OWL),
    ("foaf", vocab::FOAF),
    ("dct", vocab::DCT),
    ("dc", vocab::DC),
    ("schema", vocab::SCHEMA),
    ("skos", vocab::SKOS),
    ("sioc", vocab::SIOC),
    ("acl", vocab::ACL),
];

/// `scheme ":" rest`, with none of the characters RFC 3987 excludes.
static IRI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s<>"{}|\\^`]*$"#).expect("invalid IRI regex")
});

/// The longest NCName-shaped suffix of a predicate IRI.
static LOCAL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_.\-]*$").expect("invalid local name regex")
});

/// Writes graphs as plain RDF/XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdfXmlSerializer {
    allow_bad_iris: bool,
}

impl Default for RdfXmlSerializer {
    fn default() -> Self {
        Self::permissive()
    }
}

impl RdfXmlSerializer {
    /// Emit malformed IRIs instead of failing. Whitespace inside them is
    /// written as character references, so it reads back unchanged.
    pub fn permissive() -> Self {
        Self { allow_bad_iris: true }
    }

    /// Fail with [`SerializationError::InvalidIri`] on malformed IRIs.
    pub fn strict() -> Self {
        Self { allow_bad_iris: false }
    }

    pub fn allows_bad_iris(&self) -> bool {
        self.allow_bad_iris
    }

    /// Encode `graph` as UTF-8 RDF/XML.
    pub fn serialize(&self, graph: &Graph) -> Result<Vec<u8>, SerializationError> {
        let namespaces = self.collect_namespaces(graph)?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("rdf:RDF");
        for (prefix, ns) in &namespaces.declared {
            let name = format!("xmlns:{prefix}");
            push_attr(&mut root, &name, ns);
        }
        emit(&mut writer, Event::Start(root))?;

        let mut current: Option<&Term> = None;
        for triple in graph.iter() {
            if current != Some(&triple.subject) {
                if current.is_some() {
                    emit(&mut writer, Event::End(BytesEnd::new("rdf:Description")))?;
                }
                emit(&mut writer, Event::Start(self.description(&triple.subject)?))?;
                current = Some(&triple.subject);
            }
            self.write_property(&mut writer, &namespaces, triple)?;
        }
        if current.is_some() {
            emit(&mut writer, Event::End(BytesEnd::new("rdf:Description")))?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("rdf:RDF")))?;
        Ok(writer.into_inner())
    }

    fn collect_namespaces(&self, graph: &Graph) -> Result<Namespaces, SerializationError> {
        let mut namespaces = Namespaces::default();
        namespaces.declare(vocab::RDF);
        for triple in graph.iter() {
            let iri = triple.predicate.as_iri().ok_or_else(|| SerializationError::UnsupportedTerm {
                position: "predicate",
                term: triple.predicate.to_string(),
            })?;
            self.check_iri(iri)?;
            let (ns, _) = split_predicate(iri)?;
            namespaces.declare(ns);
        }
        Ok(namespaces)
    }

    fn description(&self, subject: &Term) -> Result<BytesStart<'static>, SerializationError> {
        let mut start = BytesStart::new("rdf:Description");
        match subject {
            Term::Iri { value } => {
                self.check_iri(value)?;
                push_attr(&mut start, "rdf:about", value);
            }
            Term::Blank { id } => {
                check_chars(id)?;
                push_attr(&mut start, "rdf:nodeID", id);
            }
            Term::Literal { .. } => {
                return Err(SerializationError::UnsupportedTerm {
                    position: "subject",
                    term: subject.to_string(),
                })
            }
        }
        Ok(start)
    }

    fn write_property(
        &self,
        writer: &mut Writer<Vec<u8>>,
        namespaces: &Namespaces,
        triple: &Triple,
    ) -> Result<(), SerializationError> {
        // predicates were checked in collect_namespaces
        let qname = match triple.predicate.as_iri() {
            Some(iri) => namespaces.qname(iri)?,
            None => {
                return Err(SerializationError::UnsupportedTerm {
                    position: "predicate",
                    term: triple.predicate.to_string(),
                })
            }
        };

        let mut start = BytesStart::new(qname.clone());
        match &triple.object {
            Term::Iri { value } => {
                self.check_iri(value)?;
                push_attr(&mut start, "rdf:resource", value);
                emit(writer, Event::Empty(start))
            }
            Term::Blank { id } => {
                check_chars(id)?;
                push_attr(&mut start, "rdf:nodeID", id);
                emit(writer, Event::Empty(start))
            }
            Term::Literal {
                value,
                datatype,
                lang,
            } => {
                check_chars(value)?;
                if let Some(lang) = lang {
                    check_chars(lang)?;
                    push_attr(&mut start, "xml:lang", lang);
                } else if let Some(dt) = datatype {
                    self.check_iri(dt)?;
                    push_attr(&mut start, "rdf:datatype", dt);
                }
                // an indented start/end pair would read back as whitespace
                if value.is_empty() {
                    return emit(writer, Event::Empty(start));
                }
                emit(writer, Event::Start(start))?;
                emit(writer, Event::Text(BytesText::new(value)))?;
                emit(writer, Event::End(BytesEnd::new(qname)))
            }
        }
    }

    fn check_iri(&self, iri: &str) -> Result<(), SerializationError> {
        check_chars(iri)?;
        if IRI_RE.is_match(iri) {
            return Ok(());
        }
        if self.allow_bad_iris {
            tracing::debug!(iri, "emitting malformed IRI");
            Ok(())
        } else {
            Err(SerializationError::InvalidIri(iri.to_string()))
        }
    }
}

// --- helpers -----------------------------------------------------------------

#[derive(Default)]
struct Namespaces {
    /// `(prefix, namespace)` in declaration order.
    declared: Vec<(String, String)>,
    prefixes: HashMap<String, String>,
    generated: usize,
}

impl Namespaces {
    fn declare(&mut self, ns: &str) {
        if self.prefixes.contains_key(ns) {
            return;
        }
        let prefix = match WELL_KNOWN_PREFIXES.iter().find(|(_, known)| *known == ns) {
            Some((prefix, _)) => prefix.to_string(),
            None => {
                self.generated += 1;
                format!("ns{}", self.generated)
            }
        };
        self.prefixes.insert(ns.to_string(), prefix.clone());
        self.declared.push((prefix, ns.to_string()));
    }

    fn qname(&self, iri: &str) -> Result<String, SerializationError> {
        let (ns, local) = split_predicate(iri)?;
        match self.prefixes.get(ns) {
            Some(prefix) => Ok(format!("{prefix}:{local}")),
            None => Err(SerializationError::UnsplittablePredicate(iri.to_string())),
        }
    }
}

/// Split a predicate IRI into namespace and XML local name.
fn split_predicate(iri: &str) -> Result<(&str, &str), SerializationError> {
    match LOCAL_NAME_RE.find(iri) {
        Some(m) if m.start() > 0 => Ok(iri.split_at(m.start())),
        _ => Err(SerializationError::UnsplittablePredicate(iri.to_string())),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn check_chars(value: &str) -> Result<(), SerializationError> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(SerializationError::IllegalCharacter {
            code: c as u32,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

/// Push an attribute, writing tab, newline and carriage return as character
/// references so that attribute-value normalization does not turn them into
/// spaces on the way back in.
fn push_attr(start: &mut BytesStart<'_>, name: &str, value: &str) {
    let mut escaped = escape(value).into_owned();
    if escaped.contains(['\t', '\n', '\r']) {
        escaped = escaped
            .replace('\t', "&#9;")
            .replace('\n', "&#10;")
            .replace('\r', "&#13;");
    }
    start.push_attribute((name.as_bytes(), escaped.as_bytes()));
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SerializationError> {
    writer
        .write_event(event)
        .map_err(|e| SerializationError::Xml(e.to_string()))
}

// --- tests -------------------------------------------------------------------
