//! Graph responses for axum handlers.
//!
//! [`HtmlWriter`] is shared handler state. A handler fetches or builds a
//! [`Graph`], extracts the [`CurrentViewer`](crate::CurrentViewer), and
//! hands both to [`HtmlWriter::respond`] together with the `Accept` header
//! and any headers it has already decided on (typically an `ETag`).

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{ACCEPT, VARY},
        HeaderMap, HeaderValue,
    },
    response::Response,
};
use ldview::{
    ApplicationMode, ContactDigest, DescriptionListStylesheet, Graph, MediaType, RenderPipeline,
    RenderRequest, Sha1Digest, Stylesheet, Viewer,
};

use crate::config::WriterConfig;
use crate::error::AppError;

/// Renders graphs into HTML responses.
#[derive(Clone, Debug)]
pub struct HtmlWriter {
    pipeline: Arc<RenderPipeline>,
    mode: ApplicationMode,
}

impl HtmlWriter {
    pub fn new(pipeline: Arc<RenderPipeline>, mode: ApplicationMode) -> Self {
        Self { pipeline, mode }
    }

    /// A writer using `stylesheet` and `digest`, configured by `config`.
    pub fn from_config(
        config: &WriterConfig,
        stylesheet: Arc<dyn Stylesheet>,
        digest: Arc<dyn ContactDigest>,
    ) -> Self {
        let pipeline = RenderPipeline::new(stylesheet, digest)
            .with_policy(config.redaction)
            .with_serializer(config.serializer());
        Self::new(Arc::new(pipeline), config.mode)
    }

    /// A writer using the built-in description-list stylesheet and SHA-1
    /// mailbox digests.
    pub fn with_default_stylesheet(config: &WriterConfig) -> Self {
        Self::from_config(
            config,
            Arc::new(DescriptionListStylesheet::new(config.title.clone())),
            Arc::new(Sha1Digest),
        )
    }

    pub fn mode(&self) -> ApplicationMode {
        self.mode
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// The request's `Accept` header, if present and readable.
    pub fn accept(headers: &HeaderMap) -> Option<&str> {
        headers.get(ACCEPT).and_then(|v| v.to_str().ok())
    }

    /// Render `graph` for `viewer` as a complete `200 OK` response.
    ///
    /// A missing `Accept` header means HTML. `headers` become the response
    /// headers after the pipeline has adjusted the `ETag` and set
    /// `Content-Type`; `Vary: Accept` is added. On failure no body is sent
    /// and the error maps to `406` or `500`.
    pub fn respond(
        &self,
        graph: &Graph,
        viewer: Viewer,
        accept: Option<&str>,
        mut headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let media_type = match accept {
            None => MediaType::Html,
            Some(accept) => MediaType::negotiate(accept).ok_or_else(|| {
                AppError::NotAcceptable(format!(
                    "cannot produce {} or {} for Accept: {accept}",
                    MediaType::Html.essence(),
                    MediaType::Xhtml.essence()
                ))
            })?,
        };
        tracing::debug!(media_type = media_type.essence(), "negotiated representation");

        let request = RenderRequest::new(viewer, self.mode, media_type);
        let body = self.pipeline.render_to_vec(graph, &request, &mut headers)?;

        headers.append(VARY, HeaderValue::from_static("accept"));
        let mut response = Response::new(Body::from(body));
        *response.headers_mut() = headers;
        Ok(response)
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentViewer;
    use crate::error::ErrorResponse;
    use axum::{
        extract::State,
        http::{
            header::{CONTENT_TYPE, ETAG},
            Request, StatusCode,
        },
        routing::get,
        Extension, Router,
    };
    use http_body_util::BodyExt;
    use ldview::{vocab, Agent, Term, TransformError, TransformParams, Triple};
    use tower::ServiceExt;

    // sha1("mailto:a@example.org")
    const MBOX_SHA1: &str = "61e82864d7559ab5c29c373d44dbc4d37c4749e5";

    struct Failing;

    impl Stylesheet for Failing {
        fn apply(&self, _: &[u8], _: &TransformParams, _: &mut HeaderMap) -> Result<Vec<u8>, TransformError> {
            Err(TransformError::new("template raised an error"))
        }
    }

    fn person() -> Graph {
        Graph::from_triples([
            Triple::new(
                Term::iri("http://example.org/person1"),
                Term::iri(vocab::FOAF_MBOX),
                Term::literal("mailto:a@example.org"),
            ),
            Triple::new(
                Term::iri("http://example.org/person1"),
                Term::iri(format!("{}name", vocab::FOAF)),
                Term::literal("Alice"),
            ),
        ])
    }

    async fn show(
        State(writer): State<HtmlWriter>,
        CurrentViewer(viewer): CurrentViewer,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let mut response_headers = HeaderMap::new();
        response_headers.insert(ETAG, HeaderValue::from_static("\"1a\""));
        writer.respond(&person(), viewer, HtmlWriter::accept(&headers), response_headers)
    }

    fn app(writer: HtmlWriter, agent: Option<Agent>) -> Router {
        let router = Router::new().route("/person", get(show)).with_state(writer);
        match agent {
            Some(agent) => router.layer(Extension(agent)),
            None => router,
        }
    }

    fn default_writer() -> HtmlWriter {
        HtmlWriter::with_default_stylesheet(&WriterConfig::default())
    }

    async fn get_person(app: Router, accept: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut request = Request::builder().uri("/person");
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn anonymous_viewer_gets_redacted_html() {
        let (status, headers, body) = get_person(app(default_writer(), None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html; charset=UTF-8");
        assert_eq!(headers[ETAG], "\"1a\"");
        assert_eq!(headers[VARY], "accept");
        assert!(body.contains(MBOX_SHA1));
        assert!(body.contains("Alice"));
        assert!(!body.contains("mailto:"));
    }

    #[tokio::test]
    async fn agent_gets_mailbox_and_own_etag() {
        let (status, headers, body) =
            get_person(app(default_writer(), Some(Agent::new("urn:agent42"))), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("mailto:a@example.org"));
        assert_ne!(headers[ETAG], "\"1a\"");

        let (_, other, _) =
            get_person(app(default_writer(), Some(Agent::new("urn:agent43"))), None).await;
        assert_ne!(headers[ETAG], other[ETAG]);
    }

    #[tokio::test]
    async fn end_user_mode_does_not_redact() {
        let config = WriterConfig {
            mode: ApplicationMode::EndUser,
            ..WriterConfig::default()
        };
        let writer = HtmlWriter::with_default_stylesheet(&config);
        let (_, _, body) = get_person(app(writer, None), None).await;
        assert!(body.contains("mailto:a@example.org"));
    }

    #[tokio::test]
    async fn xhtml_is_negotiated() {
        let (status, headers, _) = get_person(
            app(default_writer(), None),
            Some("application/xhtml+xml, text/html;q=0.9"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "application/xhtml+xml; charset=UTF-8");
    }

    #[tokio::test]
    async fn unacceptable_media_type_is_406() {
        let (status, headers, body) =
            get_person(app(default_writer(), None), Some("application/json")).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        let error: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(error.code, "not_acceptable");
    }

    #[tokio::test]
    async fn transform_failure_is_500_without_html() {
        let writer = HtmlWriter::from_config(&WriterConfig::default(), Arc::new(Failing), Arc::new(Sha1Digest));
        let (status, headers, body) = get_person(app(writer, None), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        let error: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(error.code, "internal_error");
        assert!(error.error.contains("template raised an error"));
        assert!(headers.get(ETAG).is_none());
    }
}
