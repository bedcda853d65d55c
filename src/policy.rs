/// A policy requirement that must be satisfied.
///
/// This enum represents all possible policy requirements.
/// Policies are evaluated during `PolicyGate::build()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires an authenticated principal
    Authenticated,
    /// Requires the request to originate from a trusted peer
    TrustedPeer,
}

/// Policy requiring authentication.
///
/// Use this to require that a principal is present in the request metadata.
pub struct Authenticated;

/// Policy requiring a trusted peer.
///
/// Use this on inbound notification endpoints: the remote address must be
/// accepted by the configured `TrustedPeerAuthorizer`.
pub struct TrustedPeer;

// Conversions to PolicyReq
impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<TrustedPeer> for PolicyReq {
    fn from(_: TrustedPeer) -> Self {
        PolicyReq::TrustedPeer
    }
}
