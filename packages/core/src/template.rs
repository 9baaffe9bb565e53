//! A built-in [`Stylesheet`] that lays a graph out as description lists.
//!
//! Reads the plain RDF/XML produced by
//! [`RdfXmlSerializer`](crate::RdfXmlSerializer) and writes one section per
//! resource:
//!
//! ```text
//! <div class="resource">
//!   <h2><a href="http://example.org/person1">http://example.org/person1</a></h2>
//!   <dl>
//!     <dt><a href="http://xmlns.com/foaf/0.1/mbox_sha1sum">foaf:mbox_sha1sum</a></dt>
//!     <dd>61e82864d7559ab5c29c373d44dbc4d37c4749e5</dd>
//!   </dl>
//! </div>
//! ```
//!
//! Parameters: `title` overrides the document title, `lang` sets the
//! document language and the `Content-Language` response header.
//!
//! Only the flat RDF/XML shape is understood. Nested descriptions and
//! `rdf:parseType` content are rejected rather than guessed at.

use std::collections::HashMap;

use http::header::{HeaderMap, HeaderValue, CONTENT_LANGUAGE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::transform::{MediaType, Stylesheet, TransformError, TransformParams};
use crate::types::vocab;

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Renders each resource as a heading plus a `<dl>` of its properties.
#[derive(Debug, Clone)]
pub struct DescriptionListStylesheet {
    title: String,
}

impl DescriptionListStylesheet {
    /// `title` is used when the request does not pass a `title` parameter.
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

impl Default for DescriptionListStylesheet {
    fn default() -> Self {
        Self::new("Linked Data")
    }
}

impl Stylesheet for DescriptionListStylesheet {
    fn apply(
        &self,
        input: &[u8],
        params: &TransformParams,
        headers: &mut HeaderMap,
    ) -> Result<Vec<u8>, TransformError> {
        let text = std::str::from_utf8(input)
            .map_err(|e| TransformError::with_source("input is not valid UTF-8", e))?;
        let resources = parse(text)?;

        if let Some(lang) = params.get("lang") {
            let value = HeaderValue::from_str(lang)
                .map_err(|e| TransformError::with_source(format!("invalid lang parameter {lang:?}"), e))?;
            headers.insert(CONTENT_LANGUAGE, value);
        }

        let title = params.get("title").unwrap_or(&self.title);
        render(&resources, title, params)
    }
}

// --- model -------------------------------------------------------------------

#[derive(Debug)]
struct Resource {
    id: Node,
    properties: Vec<Property>,
}

#[derive(Debug)]
enum Node {
    Iri(String),
    Blank(String),
}

#[derive(Debug)]
struct Property {
    qname: String,
    iri: String,
    value: Value,
}

#[derive(Debug)]
enum Value {
    Node(Node),
    Literal {
        text: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

// --- RDF/XML reading ---------------------------------------------------------

struct OpenProperty {
    qname: String,
    iri: String,
    lang: Option<String>,
    datatype: Option<String>,
    text: String,
}

/// Attributes of one element with prefixes resolved to namespace IRIs.
struct Attrs(Vec<(String, String, String)>);

impl Attrs {
    fn get(&self, ns: &str, local: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, l, _)| n == ns && l == local)
            .map(|(_, _, v)| v.as_str())
    }
}

#[derive(Default)]
struct Parser {
    namespaces: HashMap<String, String>,
    resources: Vec<Resource>,
    current: Option<Resource>,
    open: Option<OpenProperty>,
}

fn parse(text: &str) -> Result<Vec<Resource>, TransformError> {
    let mut parser = Parser::default();
    parser.namespaces.insert("xml".into(), vocab::XML.into());

    // Literal text is kept byte for byte; indentation between elements is
    // dropped by `Parser::text` since no property is open there.
    let mut reader = Reader::from_str(text);
    loop {
        let event = reader.read_event().map_err(|e| {
            TransformError::with_source(
                format!("malformed RDF/XML near byte {}", reader.buffer_position()),
                e,
            )
        })?;
        match event {
            Event::Start(e) => parser.start(&e, false)?,
            Event::Empty(e) => parser.start(&e, true)?,
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| TransformError::with_source("invalid character reference", err))?;
                parser.text(&text);
            }
            Event::CData(e) => parser.text(&String::from_utf8_lossy(&e)),
            Event::End(e) => {
                let name = utf8_name(e.name().as_ref())?;
                parser.end(&name)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if parser.current.is_some() || parser.open.is_some() {
        return Err(TransformError::new("RDF/XML document ended inside a description"));
    }
    Ok(parser.resources)
}

impl Parser {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), TransformError> {
        let name = utf8_name(e.name().as_ref())?;
        let attrs = self.attributes(e)?;

        if let Some(open) = &self.open {
            return Err(TransformError::new(format!(
                "nested content inside property {} is not supported",
                open.qname
            )));
        }

        let (ns, local) = self.resolve(&name)?;
        if ns == vocab::RDF && local == "RDF" {
            return Ok(());
        }

        if ns == vocab::RDF && local == "Description" {
            if self.current.is_some() {
                return Err(TransformError::new("nested rdf:Description is not supported"));
            }
            let id = node_from(&attrs, "about").ok_or_else(|| {
                TransformError::new("rdf:Description without rdf:about or rdf:nodeID")
            })?;
            let resource = Resource {
                id,
                properties: Vec::new(),
            };
            if empty {
                self.resources.push(resource);
            } else {
                self.current = Some(resource);
            }
            return Ok(());
        }

        let Some(current) = self.current.as_mut() else {
            return Err(TransformError::new(format!(
                "unexpected element {name} outside rdf:Description"
            )));
        };
        let iri = format!("{ns}{local}");
        let lang = attrs.get(vocab::XML, "lang").map(str::to_string);
        let datatype = attrs.get(vocab::RDF, "datatype").map(str::to_string);

        if empty {
            let value = match node_from(&attrs, "resource") {
                Some(node) => Value::Node(node),
                None => Value::Literal {
                    text: String::new(),
                    lang,
                    datatype,
                },
            };
            current.properties.push(Property {
                qname: name,
                iri,
                value,
            });
        } else {
            self.open = Some(OpenProperty {
                qname: name,
                iri,
                lang,
                datatype,
                text: String::new(),
            });
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(open) = self.open.as_mut() {
            open.text.push_str(text);
        }
    }

    fn end(&mut self, name: &str) -> Result<(), TransformError> {
        if let Some(open) = self.open.take() {
            if open.qname != name {
                return Err(TransformError::new(format!(
                    "mismatched end tag {name}, expected {}",
                    open.qname
                )));
            }
            if let Some(current) = self.current.as_mut() {
                current.properties.push(Property {
                    qname: open.qname,
                    iri: open.iri,
                    value: Value::Literal {
                        text: open.text,
                        lang: open.lang,
                        datatype: open.datatype,
                    },
                });
            }
            return Ok(());
        }

        let (ns, local) = self.resolve(name)?;
        if ns == vocab::RDF && local == "Description" {
            if let Some(resource) = self.current.take() {
                self.resources.push(resource);
            }
        }
        Ok(())
    }

    /// Collects `xmlns` declarations, then resolves the remaining attribute
    /// names.
    fn attributes(&mut self, e: &BytesStart<'_>) -> Result<Attrs, TransformError> {
        let mut raw = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| TransformError::with_source("malformed attribute", err))?;
            let key = utf8_name(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|err| TransformError::with_source("malformed attribute value", err))?
                .into_owned();
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.namespaces.insert(prefix.to_string(), value);
            } else if key == "xmlns" {
                self.namespaces.insert(String::new(), value);
            } else {
                raw.push((key, value));
            }
        }

        let mut resolved = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            // Unprefixed attributes have no namespace.
            let (ns, local) = match key.split_once(':') {
                Some(_) => self.resolve(&key)?,
                None => (String::new(), key),
            };
            resolved.push((ns, local, value));
        }
        Ok(Attrs(resolved))
    }

    fn resolve(&self, qname: &str) -> Result<(String, String), TransformError> {
        let (prefix, local) = qname.split_once(':').unwrap_or(("", qname));
        match self.namespaces.get(prefix) {
            Some(ns) => Ok((ns.clone(), local.to_string())),
            None => Err(TransformError::new(format!("undeclared namespace prefix in {qname}"))),
        }
    }
}

/// `rdf:<iri_attr>` as an IRI node, else `rdf:nodeID` as a blank node.
fn node_from(attrs: &Attrs, iri_attr: &str) -> Option<Node> {
    if let Some(iri) = attrs.get(vocab::RDF, iri_attr) {
        return Some(Node::Iri(iri.to_string()));
    }
    attrs
        .get(vocab::RDF, "nodeID")
        .map(|id| Node::Blank(id.to_string()))
}

fn utf8_name(bytes: &[u8]) -> Result<String, TransformError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| TransformError::with_source("element name is not valid UTF-8", e))
}

// --- HTML writing ------------------------------------------------------------

struct Html {
    writer: Writer<Vec<u8>>,
}

impl Html {
    fn event(&mut self, event: Event<'_>) -> Result<(), TransformError> {
        self.writer
            .write_event(event)
            .map_err(|e| TransformError::with_source("failed to write HTML", e))
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), TransformError> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.event(Event::Start(start))
    }

    fn close(&mut self, name: &str) -> Result<(), TransformError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), TransformError> {
        self.open(name, attrs)?;
        if !text.is_empty() {
            self.event(Event::Text(BytesText::new(text)))?;
        }
        self.close(name)
    }

    fn node(&mut self, node: &Node) -> Result<(), TransformError> {
        match node {
            Node::Iri(iri) => self.element("a", &[("href", iri.as_str())], iri),
            Node::Blank(id) => self.element("span", &[("class", "blank")], &format!("_:{id}")),
        }
    }
}

fn render(resources: &[Resource], title: &str, params: &TransformParams) -> Result<Vec<u8>, TransformError> {
    let xhtml = params.media_type() == MediaType::Xhtml;
    let mut html = Html {
        writer: Writer::new_with_indent(Vec::new(), b' ', 2),
    };

    if xhtml {
        html.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    html.event(Event::DocType(BytesText::from_escaped("html")))?;

    let mut root: Vec<(&str, &str)> = Vec::new();
    if xhtml {
        root.push(("xmlns", XHTML_NS));
    }
    if let Some(lang) = params.get("lang") {
        root.push(("lang", lang));
        if xhtml {
            root.push(("xml:lang", lang));
        }
    }
    html.open("html", &root)?;

    html.open("head", &[])?;
    html.event(Event::Empty(BytesStart::new("meta").with_attributes([("charset", "UTF-8")])))?;
    html.element("title", &[], title)?;
    html.close("head")?;

    html.open("body", &[])?;
    html.element("h1", &[], title)?;
    for resource in resources {
        html.open("div", &[("class", "resource")])?;
        html.open("h2", &[])?;
        html.node(&resource.id)?;
        html.close("h2")?;

        if !resource.properties.is_empty() {
            html.open("dl", &[])?;
            for property in &resource.properties {
                html.open("dt", &[])?;
                html.element("a", &[("href", property.iri.as_str())], &property.qname)?;
                html.close("dt")?;

                html.open("dd", &[])?;
                match &property.value {
                    Value::Node(node) => html.node(node)?,
                    Value::Literal {
                        text,
                        lang: Some(lang),
                        ..
                    } => html.element("span", &[("lang", lang.as_str())], text)?,
                    Value::Literal {
                        text,
                        datatype: Some(datatype),
                        ..
                    } => html.element("span", &[("title", datatype.as_str())], text)?,
                    Value::Literal { text, .. } => {
                        if !text.is_empty() {
                            html.event(Event::Text(BytesText::new(text)))?;
                        }
                    }
                }
                html.close("dd")?;
            }
            html.close("dl")?;
        }
        html.close("div")?;
    }
    html.close("body")?;
    html.close("html")?;

    Ok(html.writer.into_inner())
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::serialize::RdfXmlSerializer;
    use crate::types::{Term, Triple};

    fn person1() -> Term {
        Term::iri("http://example.org/person1")
    }

    fn rdfxml(graph: &Graph) -> Vec<u8> {
        RdfXmlSerializer::permissive().serialize(graph).unwrap()
    }

    fn apply(input: &[u8], params: &TransformParams) -> Result<(String, HeaderMap), TransformError> {
        let mut headers = HeaderMap::new();
        let out = DescriptionListStylesheet::default().apply(input, params, &mut headers)?;
        Ok((String::from_utf8(out).unwrap(), headers))
    }

    #[test]
    fn renders_resources_and_properties() {
        let g = Graph::from_triples([
            Triple::new(person1(), Term::iri(vocab::FOAF_MBOX), Term::literal("mailto:a@example.org")),
            Triple::new(person1(), Term::iri(format!("{}knows", vocab::FOAF)), Term::iri("http://example.org/person2")),
            Triple::new(person1(), Term::iri(format!("{}based_near", vocab::FOAF)), Term::blank("place")),
        ]);
        let (html, headers) = apply(&rdfxml(&g), &TransformParams::new(MediaType::Html)).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Linked Data</title>"));
        assert!(html.contains(r#"<a href="http://example.org/person1">http://example.org/person1</a>"#));
        assert!(html.contains(r#"<a href="http://xmlns.com/foaf/0.1/mbox">foaf:mbox</a>"#));
        assert!(html.contains("<dd>mailto:a@example.org</dd>"));
        assert!(html.contains(r#"<a href="http://example.org/person2">http://example.org/person2</a>"#));
        assert!(html.contains(r#"<span class="blank">_:place</span>"#));
        assert!(!html.contains("xmlns="));
        assert!(headers.get(CONTENT_LANGUAGE).is_none());
    }

    #[test]
    fn xhtml_has_declaration_and_namespace() {
        let g = Graph::from_triples([Triple::new(person1(), Term::iri(format!("{}name", vocab::FOAF)), Term::literal("Alice"))]);
        let params = TransformParams::new(MediaType::Xhtml).with("lang", "en").with("title", "People");
        let (html, headers) = apply(&rdfxml(&g), &params).unwrap();

        assert!(html.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(html.contains(r#"<html xmlns="http://www.w3.org/1999/xhtml" lang="en" xml:lang="en">"#));
        assert!(html.contains("<title>People</title>"));
        assert_eq!(headers[CONTENT_LANGUAGE], "en");
    }

    #[test]
    fn literal_markup_is_escaped() {
        let g = Graph::from_triples([
            Triple::new(person1(), Term::iri(format!("{}name", vocab::FOAF)), Term::lang_literal("<b>Alice</b>", "en")),
            Triple::new(
                person1(),
                Term::iri(format!("{}age", vocab::FOAF)),
                Term::typed_literal("42", format!("{}integer", vocab::XSD)),
            ),
        ]);
        let (html, _) = apply(&rdfxml(&g), &TransformParams::new(MediaType::Html)).unwrap();
        assert!(html.contains(r#"<span lang="en">&lt;b&gt;Alice&lt;/b&gt;</span>"#));
        assert!(html.contains(r#"<span title="http://www.w3.org/2001/XMLSchema#integer">42</span>"#));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn literal_whitespace_is_preserved() {
        let g = Graph::from_triples([
            Triple::new(person1(), Term::iri(format!("{}name", vocab::FOAF)), Term::literal("  padded  ")),
            Triple::new(person1(), Term::iri(format!("{}nick", vocab::FOAF)), Term::literal("   ")),
        ]);
        let (html, _) = apply(&rdfxml(&g), &TransformParams::new(MediaType::Html)).unwrap();
        assert!(html.contains("<dd>  padded  </dd>"));
        assert!(html.contains("<dd>   </dd>"));
    }

    #[test]
    fn empty_graph_renders_page_without_resources() {
        let (html, _) = apply(&rdfxml(&Graph::new()), &TransformParams::new(MediaType::Html)).unwrap();
        assert!(html.contains("<h1>Linked Data</h1>"));
        assert!(!html.contains("class=\"resource\""));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let input = br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="x"></rdf:RDF>"#;
        let err = apply(input, &TransformParams::default()).unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = apply(&[0xff, 0xfe, 0x00], &TransformParams::default()).unwrap_err();
        assert_eq!(err.message(), "input is not valid UTF-8");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn nested_property_content_is_rejected() {
        let input = br#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.org/">
  <rdf:Description rdf:about="http://example.org/a">
    <ex:p><ex:q>x</ex:q></ex:p>
  </rdf:Description>
</rdf:RDF>"#;
        let err = apply(input, &TransformParams::default()).unwrap_err();
        assert!(err.message().contains("ex:p"));
    }

    #[test]
    fn invalid_lang_parameter_is_an_error() {
        let params = TransformParams::new(MediaType::Html).with("lang", "en\nX-Injected: 1");
        let err = apply(&rdfxml(&Graph::new()), &params).unwrap_err();
        assert!(err.message().starts_with("invalid lang parameter"));
    }
}
