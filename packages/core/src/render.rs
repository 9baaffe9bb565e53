//! The render pipeline: graph in, HTML out.
//!
//! One call to [`RenderPipeline::render`] runs, in order:
//!
//! 1. `ETag` adjustment for authenticated agents ([`etag::adjust_header`]).
//! 2. Contact redaction ([`PrivacyFilter`]).
//! 3. RDF/XML serialization ([`RdfXmlSerializer`]).
//! 4. The stylesheet transform ([`TemplateTransformer`]).
//! 5. A single write of the finished document to the sink.
//!
//! Nothing reaches the sink unless steps 2–4 all succeed. The pipeline keeps
//! no per-request state and can be shared behind an `Arc`.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use http::HeaderMap;
use thiserror::Error;

use crate::digest::ContactDigest;
use crate::etag;
use crate::graph::Graph;
use crate::privacy::{PrivacyFilter, RedactionPolicy};
use crate::serialize::{RdfXmlSerializer, SerializationError};
use crate::transform::{MediaType, Stylesheet, TemplateTransformer, TransformError, TransformParams};
use crate::viewer::{ApplicationMode, Viewer};

/// Why a render produced no output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize graph: {0}")]
    Serialization(#[from] SerializationError),

    #[error("failed to transform graph: {0}")]
    Transform(#[from] TransformError),

    #[error("failed to write response body: {0}")]
    Sink(#[from] std::io::Error),
}

/// Per-request inputs.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub viewer: Viewer,
    pub mode: ApplicationMode,
    pub media_type: MediaType,
    /// Extra stylesheet parameters (`title`, `lang`, base URI, …).
    pub params: BTreeMap<String, String>,
}

impl RenderRequest {
    pub fn new(viewer: Viewer, mode: ApplicationMode, media_type: MediaType) -> Self {
        Self {
            viewer,
            mode,
            media_type,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Stylesheet parameters: caller values, then `mode` and, for
    /// authenticated viewers, `agent`. A caller-supplied `agent` is dropped;
    /// only the viewer sets it.
    fn transform_params(&self) -> TransformParams {
        let mut params = TransformParams::new(self.media_type);
        for (name, value) in self.params.iter().filter(|(name, _)| name.as_str() != "agent") {
            params.insert(name.as_str(), value.as_str());
        }
        params.insert("mode", self.mode.to_string());
        if let Some(agent) = self.viewer.as_agent() {
            params.insert("agent", agent.uri());
        }
        params
    }
}

/// Filter, serialize and transform a graph into an HTML response body.
#[derive(Clone, Debug)]
pub struct RenderPipeline {
    filter: PrivacyFilter,
    serializer: RdfXmlSerializer,
    transformer: TemplateTransformer,
}

impl RenderPipeline {
    /// A pipeline with the standard redaction policy and a permissive
    /// serializer.
    pub fn new(stylesheet: Arc<dyn Stylesheet>, digest: Arc<dyn ContactDigest>) -> Self {
        Self {
            filter: PrivacyFilter::new(digest),
            serializer: RdfXmlSerializer::permissive(),
            transformer: TemplateTransformer::new(stylesheet),
        }
    }

    pub fn with_policy(mut self, policy: RedactionPolicy) -> Self {
        self.filter = self.filter.with_policy(policy);
        self
    }

    pub fn with_serializer(mut self, serializer: RdfXmlSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Redact `contact` into `digested` instead of `foaf:mbox` into
    /// `foaf:mbox_sha1sum`.
    pub fn with_contact_predicates(mut self, contact: impl Into<String>, digested: impl Into<String>) -> Self {
        self.filter = self.filter.with_predicates(contact, digested);
        self
    }

    pub fn filter(&self) -> &PrivacyFilter {
        &self.filter
    }

    pub fn serializer(&self) -> &RdfXmlSerializer {
        &self.serializer
    }

    /// Render `graph` for `request` into `sink`.
    ///
    /// `headers` is the response header map: its `ETag` may be adjusted and
    /// the transformer sets `Content-Type`. On error the sink has received
    /// nothing.
    pub fn render<W: Write + ?Sized>(
        &self,
        graph: &Graph,
        request: &RenderRequest,
        headers: &mut HeaderMap,
        sink: &mut W,
    ) -> Result<(), RenderError> {
        let output = self.render_to_vec(graph, request, headers)?;
        sink.write_all(&output)?;
        sink.flush()?;
        Ok(())
    }

    /// Render `graph` and return the finished body.
    pub fn render_to_vec(
        &self,
        graph: &Graph,
        request: &RenderRequest,
        headers: &mut HeaderMap,
    ) -> Result<Vec<u8>, RenderError> {
        tracing::debug!(
            triples = graph.len(),
            media_type = request.media_type.essence(),
            mode = %request.mode,
            authenticated = request.viewer.is_authenticated(),
            "rendering graph"
        );

        etag::adjust_header(headers, &request.viewer);

        let visible = self.filter.filter(graph, &request.viewer, request.mode);

        let serialized = self.serializer.serialize(&visible).map_err(|e| {
            tracing::error!(error = %e, "graph serialization failed");
            e
        })?;

        let params = request.transform_params();
        let output = self.transformer.transform(&serialized, &params, headers)?;

        tracing::debug!(bytes = output.len(), "rendered graph");
        Ok(output)
    }
}

// --- tests -------------------------------------------------------------------
