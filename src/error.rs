use std::fmt;

use thiserror::Error as ThisError;

/// Errors that can occur while making an access decision.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A setting could not be read or parsed
    #[error("configuration fault: {0}")]
    Configuration(#[from] ConfigurationFault),
    /// A host name could not be resolved to an address
    #[error("resolution fault: {0}")]
    Resolution(#[from] ResolutionFault),
    /// The metadata or authorization store could not answer
    #[error("retrieval fault: {0}")]
    Retrieval(#[from] RetrievalFault),
    /// A gate requirement was not satisfied
    #[error("Policy violation: {0}")]
    Violation(#[from] Violation),
}

/// A required setting is missing or malformed.
///
/// Surfaced at startup; fatal to the feature that needed the setting.
#[derive(Debug, ThisError)]
#[error("{source_name}: {message}")]
pub struct ConfigurationFault {
    /// Where the settings came from (a file path or `"<inline>"`)
    pub source_name: String,
    /// What was wrong with them
    pub message: String,
}

impl ConfigurationFault {
    /// Creates a new configuration fault.
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// A host name or address string did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("host '{host}' could not be resolved: {reason}")]
pub struct ResolutionFault {
    /// The host as it was supplied
    pub host: String,
    /// The resolver's explanation
    pub reason: String,
}

impl ResolutionFault {
    /// Creates a new resolution fault.
    pub fn new(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            reason: reason.into(),
        }
    }
}

/// A backing store was unreachable, so no decision could be made.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{store} unavailable: {message}")]
pub struct RetrievalFault {
    /// The collaborator that failed (e.g. `"metadata store"`)
    pub store: &'static str,
    /// Details reported by the collaborator
    pub message: String,
}

impl RetrievalFault {
    /// Creates a new retrieval fault.
    pub fn new(store: &'static str, message: impl Into<String>) -> Self {
        Self {
            store,
            message: message.into(),
        }
    }
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Suggested HTTP status for rejecting the request.
    ///
    /// The handler owns the actual response; this is only the
    /// unauthorized-class code that matches the violation.
    pub fn status_class(&self) -> u16 {
        match self.kind {
            ViolationKind::Unauthenticated => 401,
            ViolationKind::UntrustedPeer { .. } => 403,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Authentication is required but missing
    Unauthenticated,
    /// The request did not come from a trusted peer
    UntrustedPeer {
        /// The remote address exactly as the transport reported it
        remote_addr: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::UntrustedPeer { remote_addr } => {
                write!(f, "Untrusted peer '{}'", remote_addr)
            }
        }
    }
}
