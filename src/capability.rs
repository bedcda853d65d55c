/// Capability proving the request passed the trusted-peer check.
///
/// This is a zero-sized type that acts as proof that the remote address
/// was accepted. Notification handlers take it by value so they cannot be
/// called for a request that skipped the check.
///
/// It cannot be constructed outside this crate; `PolicyGate` is the only
/// source.
///
/// ```compile_fail
/// # use repository_guard::InboxCap;
/// let cap = InboxCap { _private: () }; // Error: _private is private
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxCap {
    // Private field prevents construction outside the crate
    _private: (),
}

impl InboxCap {
    /// Creates a new InboxCap.
    ///
    /// This is `pub(crate)` so only the gate can create it.
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}
