use std::collections::HashSet;

use crate::error::RetrievalFault;
use crate::request::{Principal, PrincipalId};

/// Resolves whether a principal holds administrator capability.
pub trait AuthorizationService {
    /// Returns `true` if `principal` is an administrator.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalFault`] when the backing group/role store is
    /// unreachable.
    fn is_administrator(&self, principal: &Principal) -> Result<bool, RetrievalFault>;
}

/// An [`AuthorizationService`] backed by a fixed set of administrator ids.
#[derive(Debug, Clone, Default)]
pub struct AdminRoster {
    admins: HashSet<PrincipalId>,
}

impl AdminRoster {
    /// Creates a roster from administrator identifiers.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: ids.into_iter().map(PrincipalId::new).collect(),
        }
    }
}

impl AuthorizationService for AdminRoster {
    fn is_administrator(&self, principal: &Principal) -> Result<bool, RetrievalFault> {
        Ok(self.admins.contains(&principal.id))
    }
}
