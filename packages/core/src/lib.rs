//! Render RDF graphs as HTML inside an HTTP response.
//!
//! This crate is the render core of a content-negotiating response writer. A
//! graph goes through contact redaction, RDF/XML serialization and a
//! stylesheet transform, while the response `ETag` is adjusted so that
//! viewers who see different statements never share a cache entry.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | [`Term`], [`Triple`] and the [`vocab`] constants |
//! | [`graph`] | [`Graph`], a sorted set of triples |
//! | [`viewer`] | [`Viewer`], [`Agent`] and [`ApplicationMode`] |
//! | [`digest`] | [`ContactDigest`] and the default [`Sha1Digest`] |
//! | [`privacy`] | [`PrivacyFilter`]: `foaf:mbox` → `foaf:mbox_sha1sum` |
//! | [`serialize`] | [`RdfXmlSerializer`]: plain RDF/XML |
//! | [`transform`] | [`Stylesheet`], [`TemplateTransformer`], [`MediaType`] |
//! | [`template`] | [`DescriptionListStylesheet`], a ready-made stylesheet |
//! | [`etag`] | [`EntityTag`] and the per-agent adjustment |
//! | [`render`] | [`RenderPipeline`], tying it all together |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ldview::{
//!     ApplicationMode, DescriptionListStylesheet, Graph, MediaType, RenderPipeline,
//!     RenderRequest, Sha1Digest, Term, Triple, Viewer, vocab,
//! };
//!
//! let pipeline = RenderPipeline::new(
//!     Arc::new(DescriptionListStylesheet::default()),
//!     Arc::new(Sha1Digest),
//! );
//! let graph = Graph::from_triples([Triple::new(
//!     Term::iri("http://example.org/person1"),
//!     Term::iri(vocab::FOAF_MBOX),
//!     Term::iri("mailto:a@example.org"),
//! )]);
//!
//! let request = RenderRequest::new(Viewer::Anonymous, ApplicationMode::Admin, MediaType::Html);
//! let mut headers = http::HeaderMap::new();
//! let mut body = Vec::new();
//! pipeline.render(&graph, &request, &mut headers, &mut body)?;
//! ```

pub mod digest;
pub mod etag;
pub mod graph;
pub mod privacy;
pub mod render;
pub mod serialize;
pub mod template;
pub mod transform;
pub mod types;
pub mod viewer;

pub use digest::{ContactDigest, Sha1Digest};
pub use etag::EntityTag;
pub use graph::Graph;
pub use privacy::{PrivacyFilter, RedactionPolicy};
pub use render::{RenderError, RenderPipeline, RenderRequest};
pub use serialize::{RdfXmlSerializer, SerializationError};
pub use template::DescriptionListStylesheet;
pub use transform::{MediaType, Stylesheet, TemplateTransformer, TransformError, TransformParams};
pub use types::{vocab, Term, Triple};
pub use viewer::{Agent, ApplicationMode, Viewer};
