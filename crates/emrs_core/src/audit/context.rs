//! Explicit caller context for audited invocations.

use crate::model::audit::ANONYMOUS;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Claim carrying the human-readable caller name.
pub const DISPLAY_NAME_CLAIM: &str = "preferred_username";

const UNKNOWN_ORIGIN: &str = "unknown";

/// Verified identity handed over by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    subject: String,
    claims: BTreeMap<String, String>,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            claims: BTreeMap::new(),
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Stable subject identifier (`sub`).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }
}

/// Identity and origin of one invocation, resolved once by the calling layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    identity: Option<CallerIdentity>,
    origin: Option<IpAddr>,
}

impl InvocationContext {
    pub fn anonymous(origin: Option<IpAddr>) -> Self {
        Self {
            identity: None,
            origin,
        }
    }

    pub fn authenticated(identity: CallerIdentity, origin: Option<IpAddr>) -> Self {
        Self {
            identity: Some(identity),
            origin,
        }
    }

    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.identity.as_ref()
    }

    /// Subject id, or `Anonymous`.
    pub fn caller_id(&self) -> &str {
        self.identity
            .as_ref()
            .map_or(ANONYMOUS, |identity| identity.subject())
    }

    /// Display-name claim; falls back to the subject when the claim is
    /// missing, and to `Anonymous` without an identity.
    pub fn caller_name(&self) -> &str {
        match &self.identity {
            Some(identity) => identity
                .claim(DISPLAY_NAME_CLAIM)
                .unwrap_or_else(|| identity.subject()),
            None => ANONYMOUS,
        }
    }

    pub fn origin(&self) -> String {
        self.origin
            .map_or_else(|| UNKNOWN_ORIGIN.to_string(), |addr| addr.to_string())
    }
}
