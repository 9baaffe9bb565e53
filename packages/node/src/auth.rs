//! Viewer extraction.
//!
//! Authentication itself happens upstream. Whatever layer verifies the
//! caller inserts an [`Agent`] into the request extensions; this extractor
//! turns its presence or absence into a [`Viewer`].

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use ldview::{Agent, Viewer};

/// The viewer of the current request: [`Viewer::Agent`] when an [`Agent`]
/// extension is present, [`Viewer::Anonymous`] otherwise. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentViewer(pub Viewer);

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let agent = parts.extensions.get::<Agent>().cloned();
        async move { Ok(CurrentViewer(Viewer::from(agent))) }
    }
}

// --- tests -------------------------------------------------------------------
