use std::fmt;

/// Metadata about an incoming request or operation.
///
/// Contains the request identifier, the optional principal (authenticated
/// user/service) and the remote address reported by the transport.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Authenticated principal, if any
    pub principal: Option<Principal>,
    /// Remote address string, exactly as supplied by the transport layer
    pub remote_addr: String,
}

/// An authenticated user or service principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique identifier for this principal
    pub id: PrincipalId,
    /// Display name
    pub name: String,
}

impl Principal {
    /// Creates a principal from an identifier and a display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(id),
            name: name.into(),
        }
    }
}

/// The textual identifier of a principal.
///
/// Owner claims are stored as free text in a metadata authority, so this
/// type is also the parse target for that text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wraps an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// True if a metadata authority records this principal as owner.
    ///
    /// The authority must equal the identifier byte for byte: no trimming,
    /// no case folding. Any authority that differs, including an empty one
    /// when the identifier is not empty, is a non-match rather than an error.
    ///
    /// ```
    /// use repository_guard::PrincipalId;
    ///
    /// let id = PrincipalId::new("42");
    /// assert!(id.matches_authority("42"));
    /// assert!(!id.matches_authority(" 42"));
    /// assert!(PrincipalId::new(" 42").matches_authority(" 42"));
    /// ```
    pub fn matches_authority(&self, authority: &str) -> bool {
        self.0 == authority
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
