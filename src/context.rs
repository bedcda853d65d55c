use crate::capability::InboxCap;
use crate::request::Principal;

/// Validated execution context for one request.
///
/// `Ctx` cannot be constructed by user code. Use `PolicyGate` to obtain one;
/// it only exists once every requirement of the gate has been satisfied.
///
/// # Examples
///
/// ```
/// use repository_guard::{
///     Authenticated, PolicyGate, Principal, RequestMeta, StaticResolver, TrustedPeer,
///     TrustedPeerAuthorizer, TrustedPeerConfig, TrustedPeerRegistry,
/// };
/// use std::sync::Arc;
///
/// let config = TrustedPeerConfig {
///     from_ip: "203.0.113.5".to_string(),
///     ..TrustedPeerConfig::default()
/// };
/// let registry = TrustedPeerRegistry::build(&config, &StaticResolver::new()).registry;
/// let authorizer = TrustedPeerAuthorizer::new(Arc::new(registry), StaticResolver::new());
///
/// let meta = RequestMeta {
///     request_id: "req-123".to_string(),
///     principal: Some(Principal::new("7", "Alice")),
///     remote_addr: "203.0.113.5".to_string(),
/// };
///
/// let ctx = PolicyGate::new(meta)
///     .require(Authenticated)
///     .require(TrustedPeer)
///     .build(&authorizer)
///     .expect("policies satisfied");
///
/// assert!(ctx.inbox_cap().is_some());
/// assert_eq!(ctx.principal().map(|p| p.id.as_str()), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct Ctx {
    request_id: String,
    principal: Option<Principal>,
    remote_addr: String,
    inbox_cap: Option<InboxCap>,
}

impl Ctx {
    /// Creates a context after the gate has validated its requirements.
    ///
    /// This is `pub(crate)` so only code within this crate can create it.
    pub(crate) fn new_validated(
        request_id: String,
        principal: Option<Principal>,
        remote_addr: String,
        inbox_cap: Option<InboxCap>,
    ) -> Self {
        Self {
            request_id,
            principal,
            remote_addr,
            inbox_cap,
        }
    }

    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal if present.
    ///
    /// Pass this to a visibility evaluator when serializing item metadata.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the remote address as reported by the transport.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Returns the inbox capability if present.
    ///
    /// Returns `Some(InboxCap)` if the trusted-peer requirement was checked
    /// and satisfied, `None` otherwise.
    pub fn inbox_cap(&self) -> Option<InboxCap> {
        self.inbox_cap
    }
}
