//! Applying a compiled stylesheet to serialized RDF/XML.
//!
//! The stylesheet itself is opaque: anything implementing [`Stylesheet`] can
//! turn the serializer's output plus a set of parameters into bytes of the
//! negotiated [`MediaType`]. [`TemplateTransformer`] wraps one and makes sure
//! every failure comes back as a [`TransformError`] with its cause attached.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The media types this writer produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaType {
    #[default]
    Html,
    Xhtml,
}

impl MediaType {
    /// Full `Content-Type` value, including the charset.
    pub const fn as_str(self) -> &'static str {
        match self {
            MediaType::Html => "text/html; charset=UTF-8",
            MediaType::Xhtml => "application/xhtml+xml; charset=UTF-8",
        }
    }

    /// The bare `type/subtype`.
    pub const fn essence(self) -> &'static str {
        match self {
            MediaType::Html => "text/html",
            MediaType::Xhtml => "application/xhtml+xml",
        }
    }

    /// Pick a media type from an `Accept` header value.
    ///
    /// Honours q-values; `text/*` and `*/*` select HTML; ties go to the entry
    /// listed first; `q=0` excludes. Returns `None` when neither HTML nor
    /// XHTML is acceptable.
    pub fn negotiate(accept: &str) -> Option<Self> {
        let mut best: Option<(MediaType, f32)> = None;
        for entry in accept.split(',') {
            let mut parts = entry.split(';').map(str::trim);
            let range = parts.next().unwrap_or_default().to_ascii_lowercase();
            let quality = parts
                .filter_map(|p| p.strip_prefix("q=").or_else(|| p.strip_prefix("Q=")))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            let candidate = match range.as_str() {
                "text/html" | "text/*" | "*/*" => MediaType::Html,
                "application/xhtml+xml" => MediaType::Xhtml,
                _ => continue,
            };
            if quality <= 0.0 {
                continue;
            }
            if best.map_or(true, |(_, q)| quality > q) {
                best = Some((candidate, quality));
            }
        }
        best.map(|(media_type, _)| media_type)
    }
}

/// Formats the full `Content-Type` value.
impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" | "text/html" => Ok(MediaType::Html),
            "xhtml" | "application/xhtml+xml" => Ok(MediaType::Xhtml),
            _ => Err(format!("unsupported media type {:?}; expected html or xhtml", s)),
        }
    }
}

/// Values the stylesheet may consult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformParams {
    media_type: MediaType,
    values: BTreeMap<String, String>,
}

impl TransformParams {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            values: BTreeMap::new(),
        }
    }

    /// Add or replace a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A failure raised while running a stylesheet.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the engine error that caused the failure.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A compiled template that turns serialized RDF/XML into a document.
///
/// Implementations are shared between concurrent requests and only ever see
/// `&self`; any per-run state belongs on the stack of [`apply`](Self::apply).
/// They may add response headers other than `Content-Type`, which the
/// transformer owns.
pub trait Stylesheet: Send + Sync {
    fn apply(
        &self,
        input: &[u8],
        params: &TransformParams,
        headers: &mut HeaderMap,
    ) -> Result<Vec<u8>, TransformError>;
}

/// Runs a [`Stylesheet`] and owns the `Content-Type` of its result.
#[derive(Clone)]
pub struct TemplateTransformer {
    stylesheet: Arc<dyn Stylesheet>,
}

impl TemplateTransformer {
    pub fn new(stylesheet: Arc<dyn Stylesheet>) -> Self {
        Self { stylesheet }
    }

    /// Transform `input`, returning the complete output.
    ///
    /// On failure the error is logged and returned; `headers` may already
    /// hold values the stylesheet set before failing, but `Content-Type` is
    /// only written on success.
    pub fn transform(
        &self,
        input: &[u8],
        params: &TransformParams,
        headers: &mut HeaderMap,
    ) -> Result<Vec<u8>, TransformError> {
        match self.stylesheet.apply(input, params, headers) {
            Ok(output) => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(params.media_type().as_str()),
                );
                Ok(output)
            }
            Err(e) => {
                tracing::error!(error = %e, cause = ?std::error::Error::source(&e).map(|s| s.to_string()), "template transformation failed");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for TemplateTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateTransformer").finish_non_exhaustive()
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_LANGUAGE;

    struct Echo;

    impl Stylesheet for Echo {
        fn apply(&self, input: &[u8], params: &TransformParams, headers: &mut HeaderMap) -> Result<Vec<u8>, TransformError> {
            if let Some(lang) = params.get("lang") {
                let value = HeaderValue::from_str(lang).map_err(|e| TransformError::with_source("bad lang", e))?;
                headers.insert(CONTENT_LANGUAGE, value);
            }
            Ok(input.to_vec())
        }
    }

    struct Broken;

    impl Stylesheet for Broken {
        fn apply(&self, _: &[u8], _: &TransformParams, _: &mut HeaderMap) -> Result<Vec<u8>, TransformError> {
            let cause = std::io::Error::new(std::io::ErrorKind::InvalidData, "unexpected end of input");
            Err(TransformError::with_source("stylesheet failed", cause))
        }
    }

    #[test]
    fn sets_content_type_on_success() {
        let transformer = TemplateTransformer::new(Arc::new(Echo));
        let mut headers = HeaderMap::new();
        let params = TransformParams::new(MediaType::Xhtml).with("lang", "en");
        let out = transformer.transform(b"<rdf:RDF/>", &params, &mut headers).unwrap();
        assert_eq!(out, b"<rdf:RDF/>");
        assert_eq!(headers[CONTENT_TYPE], "application/xhtml+xml; charset=UTF-8");
        assert_eq!(headers[CONTENT_LANGUAGE], "en");
    }

    #[test]
    fn failure_keeps_cause_and_skips_content_type() {
        let transformer = TemplateTransformer::new(Arc::new(Broken));
        let mut headers = HeaderMap::new();
        let err = transformer
            .transform(b"", &TransformParams::new(MediaType::Html), &mut headers)
            .unwrap_err();
        assert_eq!(err.message(), "stylesheet failed");
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "unexpected end of input");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn negotiate_prefers_highest_quality() {
        assert_eq!(MediaType::negotiate("text/html"), Some(MediaType::Html));
        assert_eq!(
            MediaType::negotiate("text/html;q=0.8, application/xhtml+xml"),
            Some(MediaType::Xhtml)
        );
        assert_eq!(
            MediaType::negotiate("application/xhtml+xml, text/html"),
            Some(MediaType::Xhtml)
        );
        assert_eq!(MediaType::negotiate("*/*"), Some(MediaType::Html));
        assert_eq!(
            MediaType::negotiate("application/json, text/*;q=0.1"),
            Some(MediaType::Html)
        );
    }

    #[test]
    fn negotiate_rejects_unacceptable() {
        assert_eq!(MediaType::negotiate("application/json"), None);
        assert_eq!(MediaType::negotiate("text/html;q=0"), None);
        assert_eq!(MediaType::negotiate(""), None);
    }

    #[test]
    fn params_lookup() {
        let params = TransformParams::new(MediaType::Html).with("title", "People").with("title", "Agents");
        assert_eq!(params.get("title"), Some("Agents"));
        assert_eq!(params.get("lang"), None);
        assert_eq!(params.iter().count(), 1);
    }

    #[test]
    fn media_type_parses() {
        assert_eq!("xhtml".parse::<MediaType>(), Ok(MediaType::Xhtml));
        assert_eq!("text/html".parse::<MediaType>(), Ok(MediaType::Html));
        assert!("json".parse::<MediaType>().is_err());
    }
}
