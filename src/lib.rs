//! Access decisions for an institutional repository.
//!
//! Two independent decisions are made here, both from untrusted input:
//! - **Field visibility**: may a metadata field of an item be returned to the
//!   requesting principal? Administrators who are declared owners of the item
//!   (through `cris.owner` values whose authority carries their identifier)
//!   may see owner-restricted fields.
//! - **Trusted peers**: does an inbound notification come from a configured
//!   peer, by IP literal, by hostname resolved at startup, or from loopback?
//!
//! # Core Types
//!
//! - [`OwnerAdminEvaluator`]: owner-administrator field visibility
//! - [`VisibilityPolicy`]: evaluator chain keyed by [`SecurityLevel`]
//! - [`TrustedPeerRegistry`]: immutable trusted peer set, built once
//! - [`TrustedPeerAuthorizer`]: per-request peer check
//! - [`PolicyGate`]: validates request requirements and yields a [`Ctx`]
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use repository_guard::{
//!     GuardConfig, PolicyGate, RequestMeta, StaticResolver, TrustedPeer,
//!     TrustedPeerAuthorizer, TrustedPeerRegistry,
//! };
//!
//! let config = GuardConfig::from_toml_str(r#"
//! [ldn-trusted-services]
//! localhost_default = true
//! from_hostname = "notify.example.org"
//! "#).expect("valid config");
//!
//! let resolver = StaticResolver::new()
//!     .with_host("notify.example.org", "203.0.113.5".parse().unwrap());
//! let build = TrustedPeerRegistry::build(&config.ldn_trusted, &resolver);
//! let authorizer = TrustedPeerAuthorizer::new(Arc::new(build.registry), resolver);
//!
//! let meta = RequestMeta {
//!     request_id: "req-123".to_string(),
//!     principal: None,
//!     remote_addr: "203.0.113.5".to_string(),
//! };
//! let ctx = PolicyGate::new(meta)
//!     .require(TrustedPeer)
//!     .build(&authorizer)
//!     .expect("peer is trusted");
//! assert!(ctx.inbox_cap().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authz;
mod capability;
mod config;
mod context;
mod error;
mod gate;
mod metadata;
mod peer;
mod policy;
mod request;
mod visibility;

pub use authz::{AdminRoster, AuthorizationService};
pub use capability::InboxCap;
pub use config::{GuardConfig, TrustedPeerConfig};
pub use context::Ctx;
pub use error::{ConfigurationFault, Error, ResolutionFault, RetrievalFault, Violation, ViolationKind};
pub use gate::PolicyGate;
pub use metadata::{
    Item, ItemMetadata, MetadataField, MetadataStore, MetadataValue, SecurityLevel, OWNER_ELEMENT,
    OWNER_SCHEMA,
};
pub use peer::{
    PeerCheck, PeerDecision, RegistryBuild, Resolver, StaticResolver, SystemResolver,
    TrustedPeerAuthorizer, TrustedPeerRegistry,
};
pub use policy::{Authenticated, TrustedPeer};
pub use request::{Principal, PrincipalId, RequestMeta};
pub use visibility::{OwnerAdminEvaluator, SecurityEvaluation, VisibilityPolicy};
