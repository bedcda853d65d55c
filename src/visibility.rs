//! Field-level visibility decisions.
//!
//! [`OwnerAdminEvaluator`] answers the owner-administrator question for a
//! single field. [`VisibilityPolicy`] chains evaluators by security level so
//! a serializer can drop every value the requester may not see.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::authz::AuthorizationService;
use crate::error::Error;
use crate::metadata::{
    Item, MetadataField, MetadataStore, MetadataValue, SecurityLevel, OWNER_ELEMENT, OWNER_SCHEMA,
};
use crate::request::{Principal, PrincipalId};

/// Decides whether a metadata field may be returned to a requester.
pub trait SecurityEvaluation {
    /// Returns `true` if `field` of `item` may be shown to `principal`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the decision cannot be made, for example
    /// because a backing store is unreachable.
    fn allow_field_return(
        &self,
        principal: Option<&Principal>,
        item: &Item,
        field: &MetadataField,
    ) -> Result<bool, Error>;
}

/// Grants visibility to administrators who are declared owners of the item.
///
/// Ownership is read from the item's `cris.owner` values: the authority of
/// at least one of them must equal the principal's identifier. Non-admins and
/// anonymous requests are always refused by this evaluator.
///
/// # Examples
///
/// ```
/// use repository_guard::{AdminRoster, Item, ItemMetadata, MetadataField, OwnerAdminEvaluator, Principal};
///
/// let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7"]), ItemMetadata);
///
/// let mut item = Item::new("item-1");
/// item.add_owner("Alice", "7");
///
/// let alice = Principal::new("7", "Alice");
/// let field = MetadataField::new("dc", "description", Some("provenance"));
/// assert!(evaluator.can_return_field(Some(&alice), &item, &field).unwrap());
/// assert!(!evaluator.can_return_field(None, &item, &field).unwrap());
/// ```
pub struct OwnerAdminEvaluator<A, M> {
    authz: A,
    store: M,
}

impl<A, M> OwnerAdminEvaluator<A, M>
where
    A: AuthorizationService,
    M: MetadataStore,
{
    /// Creates an evaluator from its collaborators.
    pub fn new(authz: A, store: M) -> Self {
        Self { authz, store }
    }

    /// Returns `true` iff `principal` is an administrator listed as an owner
    /// of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieval`] when the authorization service or the
    /// metadata store cannot answer. No retry is attempted.
    pub fn can_return_field(
        &self,
        principal: Option<&Principal>,
        item: &Item,
        field: &MetadataField,
    ) -> Result<bool, Error> {
        let Some(principal) = principal else {
            debug!(item = %item.id, field = %field, "anonymous request, field withheld");
            return Ok(false);
        };

        if !self.authz.is_administrator(principal)? {
            debug!(item = %item.id, field = %field, principal = %principal.id, "not an administrator, field withheld");
            return Ok(false);
        }

        let owners = self
            .store
            .values_for_field(item, OWNER_SCHEMA, OWNER_ELEMENT)?;
        let allowed = is_listed_owner(&owners, &principal.id);

        debug!(
            item = %item.id,
            field = %field,
            principal = %principal.id,
            allowed,
            "owner-administrator visibility evaluated"
        );
        Ok(allowed)
    }
}

impl<A, M> SecurityEvaluation for OwnerAdminEvaluator<A, M>
where
    A: AuthorizationService,
    M: MetadataStore,
{
    fn allow_field_return(
        &self,
        principal: Option<&Principal>,
        item: &Item,
        field: &MetadataField,
    ) -> Result<bool, Error> {
        self.can_return_field(principal, item, field)
    }
}

impl<A, M> fmt::Debug for OwnerAdminEvaluator<A, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerAdminEvaluator").finish_non_exhaustive()
    }
}

/// True if any owner value carries an authority equal to `id`.
fn is_listed_owner(owners: &[MetadataValue], id: &PrincipalId) -> bool {
    owners
        .iter()
        .filter_map(|v| v.authority.as_deref())
        .any(|authority| id.matches_authority(authority))
}

type BoxedEvaluation = Box<dyn SecurityEvaluation + Send + Sync>;

/// Evaluator chain keyed by security level.
///
/// Values without a level, or at [`SecurityLevel::PUBLIC`], are always
/// visible. A restricted value is visible only when an evaluator is
/// registered for its level and allows its field; unregistered levels are
/// hidden.
#[derive(Default)]
pub struct VisibilityPolicy {
    evaluators: HashMap<SecurityLevel, BoxedEvaluation>,
}

impl VisibilityPolicy {
    /// Creates a policy with no restricted levels registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the evaluator for `level`, replacing any previous one.
    pub fn with_level<E>(mut self, level: SecurityLevel, evaluator: E) -> Self
    where
        E: SecurityEvaluation + Send + Sync + 'static,
    {
        self.evaluators.insert(level, Box::new(evaluator));
        self
    }

    /// Returns the values of `item` that `principal` may see, in item order.
    ///
    /// Each evaluator is consulted at most once per distinct field.
    ///
    /// # Errors
    ///
    /// Propagates the first evaluator error; a partial result is never
    /// returned.
    pub fn visible_values<'a>(
        &self,
        principal: Option<&Principal>,
        item: &'a Item,
    ) -> Result<Vec<&'a MetadataValue>, Error> {
        let mut decided: HashMap<(SecurityLevel, &MetadataField), bool> = HashMap::new();
        let mut visible = Vec::with_capacity(item.metadata.len());

        for value in &item.metadata {
            let level = match value.security_level {
                None | Some(SecurityLevel::PUBLIC) => {
                    visible.push(value);
                    continue;
                }
                Some(level) => level,
            };

            let Some(evaluator) = self.evaluators.get(&level) else {
                continue;
            };

            let allowed = match decided.get(&(level, &value.field)) {
                Some(allowed) => *allowed,
                None => {
                    let allowed = evaluator.allow_field_return(principal, item, &value.field)?;
                    decided.insert((level, &value.field), allowed);
                    allowed
                }
            };

            if allowed {
                visible.push(value);
            }
        }

        Ok(visible)
    }
}

impl fmt::Debug for VisibilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut levels: Vec<_> = self.evaluators.keys().collect();
        levels.sort();
        f.debug_struct("VisibilityPolicy")
            .field("levels", &levels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::authz::AdminRoster;
    use crate::error::RetrievalFault;
    use crate::metadata::ItemMetadata;

    struct DownStore;

    impl MetadataStore for DownStore {
        fn values_for_field(
            &self,
            _item: &Item,
            _schema: &str,
            _element: &str,
        ) -> Result<Vec<MetadataValue>, RetrievalFault> {
            Err(RetrievalFault::new("metadata store", "connection refused"))
        }
    }

    struct DownAuthz;

    impl AuthorizationService for DownAuthz {
        fn is_administrator(&self, _principal: &Principal) -> Result<bool, RetrievalFault> {
            Err(RetrievalFault::new("authorization service", "timed out"))
        }
    }

    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    impl MetadataStore for &CountingStore {
        fn values_for_field(
            &self,
            item: &Item,
            schema: &str,
            element: &str,
        ) -> Result<Vec<MetadataValue>, RetrievalFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ItemMetadata.values_for_field(item, schema, element)
        }
    }

    struct CountingEvaluation {
        calls: Arc<AtomicUsize>,
        answer: bool,
    }

    impl SecurityEvaluation for CountingEvaluation {
        fn allow_field_return(
            &self,
            _principal: Option<&Principal>,
            _item: &Item,
            _field: &MetadataField,
        ) -> Result<bool, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    fn owned_item(owner: &str) -> Item {
        let mut item = Item::new("item-1");
        item.add_value(MetadataField::new("dc", "title", None), "Title");
        item.add_owner("Owner", owner);
        item
    }

    fn note_field() -> MetadataField {
        MetadataField::new("cris", "note", None)
    }

    #[test]
    fn admin_owner_may_see_field() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7"]), ItemMetadata);
        let principal = Principal::new("7", "Alice");
        let allowed = evaluator
            .can_return_field(Some(&principal), &owned_item("7"), &note_field())
            .unwrap();
        assert!(allowed);
    }

    #[test]
    fn admin_who_is_not_owner_is_refused() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7", "8"]), ItemMetadata);
        let principal = Principal::new("8", "Bob");
        let allowed = evaluator
            .can_return_field(Some(&principal), &owned_item("7"), &note_field())
            .unwrap();
        assert!(!allowed);
    }

    #[test]
    fn owner_who_is_not_admin_is_refused() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::default(), ItemMetadata);
        let principal = Principal::new("7", "Alice");
        let allowed = evaluator
            .can_return_field(Some(&principal), &owned_item("7"), &note_field())
            .unwrap();
        assert!(!allowed);
    }

    #[test]
    fn padded_authority_does_not_match_unpadded_id() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7"]), ItemMetadata);
        let principal = Principal::new("7", "Alice");
        let allowed = evaluator
            .can_return_field(Some(&principal), &owned_item(" 7"), &note_field())
            .unwrap();
        assert!(!allowed);
    }

    #[test]
    fn admin_id_matching_authority_byte_for_byte_is_allowed() {
        for id in [" 7", "7 ", ""] {
            let evaluator = OwnerAdminEvaluator::new(AdminRoster::new([id]), ItemMetadata);
            let principal = Principal::new(id, "Padded");
            let allowed = evaluator
                .can_return_field(Some(&principal), &owned_item(id), &note_field())
                .unwrap();
            assert!(allowed, "admin {:?} should match an identical authority", id);
        }
    }

    #[test]
    fn authorization_failure_is_propagated_before_store_lookup() {
        let store = CountingStore::default();
        let evaluator = OwnerAdminEvaluator::new(DownAuthz, &store);
        let principal = Principal::new("7", "Alice");
        let result = evaluator.can_return_field(Some(&principal), &owned_item("7"), &note_field());
        assert!(matches!(result, Err(Error::Retrieval(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn owner_value_without_authority_is_ignored() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7"]), ItemMetadata);
        let mut item = Item::new("item-2");
        item.add_value(MetadataField::owner(), "7");
        let principal = Principal::new("7", "Alice");
        assert!(!evaluator
            .can_return_field(Some(&principal), &item, &note_field())
            .unwrap());
    }

    #[test]
    fn store_failure_is_propagated_for_admins() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::new(["7"]), DownStore);
        let principal = Principal::new("7", "Alice");
        let result = evaluator.can_return_field(Some(&principal), &owned_item("7"), &note_field());
        assert!(matches!(result, Err(Error::Retrieval(_))));
    }

    #[test]
    fn store_is_not_consulted_for_non_admins() {
        let evaluator = OwnerAdminEvaluator::new(AdminRoster::default(), DownStore);
        let principal = Principal::new("7", "Alice");
        let result = evaluator.can_return_field(Some(&principal), &owned_item("7"), &note_field());
        assert!(matches!(result, Ok(false)));
    }

    #[test]
    fn policy_hides_restricted_values_without_evaluator() {
        let mut item = owned_item("7");
        item.add_value(note_field(), "curator note")
            .security_level = Some(SecurityLevel(1));

        let visible = VisibilityPolicy::new()
            .visible_values(None, &item)
            .unwrap();
        let texts: Vec<&str> = visible.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(texts, vec!["Title", "Owner"]);
    }

    #[test]
    fn policy_consults_evaluator_once_per_field() {
        let mut item = Item::new("item-3");
        for text in ["a", "b", "c"] {
            item.add_value(note_field(), text).security_level = Some(SecurityLevel::OWNER_ADMIN);
        }
        item.add_value(MetadataField::new("cris", "memo", None), "d")
            .security_level = Some(SecurityLevel::OWNER_ADMIN);

        let calls = Arc::new(AtomicUsize::new(0));
        let policy = VisibilityPolicy::new().with_level(
            SecurityLevel::OWNER_ADMIN,
            CountingEvaluation {
                calls: Arc::clone(&calls),
                answer: true,
            },
        );

        let visible = policy.visible_values(None, &item).unwrap();
        assert_eq!(visible.len(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn policy_shows_owner_admin_values_to_owning_admin() {
        let mut item = owned_item("7");
        item.add_value(note_field(), "curator note").security_level =
            Some(SecurityLevel::OWNER_ADMIN);

        let policy = VisibilityPolicy::new().with_level(
            SecurityLevel::OWNER_ADMIN,
            OwnerAdminEvaluator::new(AdminRoster::new(["7", "8"]), ItemMetadata),
        );

        let alice = Principal::new("7", "Alice");
        let bob = Principal::new("8", "Bob");

        let for_alice = policy.visible_values(Some(&alice), &item).unwrap();
        assert_eq!(for_alice.len(), 3);

        let for_bob = policy.visible_values(Some(&bob), &item).unwrap();
        assert_eq!(for_bob.len(), 2);
        assert!(for_bob.iter().all(|v| v.value != "curator note"));
    }

    #[test]
    fn policy_propagates_evaluator_errors() {
        let mut item = owned_item("7");
        item.add_value(note_field(), "curator note").security_level =
            Some(SecurityLevel::OWNER_ADMIN);

        let policy = VisibilityPolicy::new().with_level(
            SecurityLevel::OWNER_ADMIN,
            OwnerAdminEvaluator::new(AdminRoster::new(["7"]), DownStore),
        );
        let alice = Principal::new("7", "Alice");
        assert!(policy.visible_values(Some(&alice), &item).is_err());
    }
}
