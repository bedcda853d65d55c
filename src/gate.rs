use tracing::{debug, warn};

use crate::{
    capability::InboxCap,
    context::Ctx,
    error::{Violation, ViolationKind},
    peer::{Resolver, TrustedPeerAuthorizer},
    policy::PolicyReq,
    request::RequestMeta,
};

/// The policy enforcement gate.
///
/// `PolicyGate` is the only way to construct a valid `Ctx`.
/// It validates policy requirements before granting capabilities.
///
/// # Examples
///
/// ```
/// use repository_guard::{
///     PolicyGate, RequestMeta, StaticResolver, TrustedPeer, TrustedPeerAuthorizer,
///     TrustedPeerConfig, TrustedPeerRegistry, ViolationKind,
/// };
/// use std::sync::Arc;
///
/// let registry = TrustedPeerRegistry::build(&TrustedPeerConfig::default(), &StaticResolver::new()).registry;
/// let authorizer = TrustedPeerAuthorizer::new(Arc::new(registry), StaticResolver::new());
///
/// let meta = RequestMeta {
///     request_id: "req-123".to_string(),
///     principal: None,
///     remote_addr: "203.0.113.6".to_string(),
/// };
///
/// let err = PolicyGate::new(meta)
///     .require(TrustedPeer)
///     .build(&authorizer)
///     .unwrap_err();
///
/// assert!(matches!(err.kind, ViolationKind::UntrustedPeer { .. }));
/// assert_eq!(err.status_class(), 403);
/// ```
pub struct PolicyGate {
    meta: RequestMeta,
    requirements: Vec<PolicyReq>,
}

impl PolicyGate {
    /// Creates a new policy gate with the given request metadata.
    pub fn new(meta: RequestMeta) -> Self {
        Self {
            meta,
            requirements: Vec::new(),
        }
    }

    /// Adds a policy requirement to the gate, deduplicating identical requirements.
    ///
    /// Returns the updated gate to allow method chaining.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();

        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }

        self
    }

    /// Builds a `Ctx` from the gate after validating accumulated policy requirements.
    ///
    /// Requirements are checked in the order they were added. If all pass,
    /// an `InboxCap` is granted when `TrustedPeer` was required.
    ///
    /// # Errors
    ///
    /// Returns the `Violation` of the first requirement that fails.
    pub fn build<R: Resolver>(self, authorizer: &TrustedPeerAuthorizer<R>) -> Result<Ctx, Violation> {
        for req in &self.requirements {
            self.validate_one(req, authorizer).inspect_err(|v| {
                warn!(request_id = %self.meta.request_id, violation = %v, "request rejected");
            })?;
        }

        let inbox_cap = if self.requirements.contains(&PolicyReq::TrustedPeer) {
            Some(InboxCap::new())
        } else {
            None
        };

        debug!(request_id = %self.meta.request_id, requirements = self.requirements.len(), "gate passed");

        Ok(Ctx::new_validated(
            self.meta.request_id,
            self.meta.principal,
            self.meta.remote_addr,
            inbox_cap,
        ))
    }

    /// Validates a single policy requirement.
    fn validate_one<R: Resolver>(
        &self,
        req: &PolicyReq,
        authorizer: &TrustedPeerAuthorizer<R>,
    ) -> Result<(), Violation> {
        match req {
            PolicyReq::Authenticated => {
                if self.meta.principal.is_none() {
                    return Err(Violation::new(
                        ViolationKind::Unauthenticated,
                        "Authentication required",
                    ));
                }
            }
            PolicyReq::TrustedPeer => {
                if !authorizer.is_authorized(&self.meta.remote_addr) {
                    return Err(Violation::new(
                        ViolationKind::UntrustedPeer {
                            remote_addr: self.meta.remote_addr.clone(),
                        },
                        "Remote address is not a trusted notification peer",
                    ));
                }
            }
        }
        Ok(())
    }
}
