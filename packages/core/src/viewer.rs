//! Who is looking: [`Viewer`], [`Agent`] and [`ApplicationMode`].
//!
//! Authentication itself happens upstream. By the time a request reaches the
//! renderer it is either anonymous or carries an [`Agent`] whose identity URI
//! has already been verified.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// An authenticated agent, identified by a stable URI (WebID, `did:key`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Agent {
    uri: String,
}

impl Agent {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// The agent's identity URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// A stable numeric fingerprint of the agent's identity.
    ///
    /// The first 8 bytes (big-endian) of SHA-256 over the URI. Identical
    /// across processes and builds, so adjusted ETags survive restarts. Not
    /// collision-free.
    pub fn fingerprint(&self) -> u64 {
        let digest = Sha256::digest(self.uri.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix)
    }
}

/// The identity context of the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    Agent(Agent),
}

impl Viewer {
    /// Shorthand for `Viewer::Agent(Agent::new(uri))`.
    pub fn agent(uri: impl Into<String>) -> Self {
        Viewer::Agent(Agent::new(uri))
    }

    /// The authenticated agent, if any.
    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            Viewer::Agent(agent) => Some(agent),
            Viewer::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.as_agent().is_some()
    }
}

impl From<Option<Agent>> for Viewer {
    fn from(agent: Option<Agent>) -> Self {
        agent.map_or(Viewer::Anonymous, Viewer::Agent)
    }
}

/// Which kind of application is serving the request.
///
/// End-user applications show contact details; administrative
/// applications hide them from anonymous viewers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApplicationMode {
    EndUser,
    #[default]
    Admin,
}

/// Formats the mode as `end-user` or `admin`.
impl fmt::Display for ApplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationMode::EndUser => write!(f, "end-user"),
            ApplicationMode::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for ApplicationMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "end-user" => Ok(ApplicationMode::EndUser),
            "admin" => Ok(ApplicationMode::Admin),
            _ => Err(format!(
                "unknown application mode {:?}; expected one of: end-user, admin",
                s
            )),
        }
    }
}

// --- tests -------------------------------------------------------------------
