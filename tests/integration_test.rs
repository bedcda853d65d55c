//! End-to-end flows: configuration → registry → gate, and item
//! serialization through the visibility policy.

use std::sync::Arc;

use repository_guard::{
    AdminRoster, Authenticated, Error, GuardConfig, Item, ItemMetadata, MetadataField,
    OwnerAdminEvaluator, PeerDecision, PolicyGate, Principal, RequestMeta, SecurityLevel,
    StaticResolver, TrustedPeer, TrustedPeerAuthorizer, TrustedPeerRegistry, ViolationKind,
    VisibilityPolicy,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn authorizer_from(toml: &str, resolver: StaticResolver) -> TrustedPeerAuthorizer<StaticResolver> {
    let config = GuardConfig::from_toml_str(toml).expect("valid config");
    let build = TrustedPeerRegistry::build(&config.ldn_trusted, &resolver);
    TrustedPeerAuthorizer::new(Arc::new(build.registry), resolver)
}

fn inbound(remote: &str) -> RequestMeta {
    RequestMeta {
        request_id: format!("ldn-{remote}"),
        principal: None,
        remote_addr: remote.to_string(),
    }
}

#[test]
fn loopback_only_configuration() {
    init_tracing();
    let auth = authorizer_from(
        "[ldn-trusted-services]\nlocalhost_default = true\n",
        StaticResolver::new(),
    );

    assert!(auth.is_authorized("127.0.0.1"));
    assert!(!auth.is_authorized("203.0.113.5"));
}

#[test]
fn ip_list_configuration() {
    init_tracing();
    let auth = authorizer_from(
        "[ldn-trusted-services]\nfrom_ip = \"203.0.113.5,198.51.100.9\"\n",
        StaticResolver::new(),
    );

    assert!(auth.is_authorized("203.0.113.5"));
    assert!(!auth.is_authorized("203.0.113.6"));
    assert!(!auth.is_authorized("127.0.0.1"));
}

#[test]
fn hostname_configuration_resolves_at_build_time() {
    init_tracing();
    let resolver = StaticResolver::new().with_host("example.org", "203.0.113.5".parse().unwrap());
    let auth = authorizer_from(
        "[ldn-trusted-services]\nfrom_hostname = \"example.org,bad.invalid\"\n",
        resolver,
    );

    assert_eq!(auth.check("203.0.113.5").decision, PeerDecision::TrustedListed);
    assert_eq!(auth.registry().len(), 1);
}

#[test]
fn gate_rejects_untrusted_notification() {
    init_tracing();
    let auth = authorizer_from(
        "[ldn-trusted-services]\nfrom_ip = \"203.0.113.5\"\n",
        StaticResolver::new(),
    );

    let accepted = PolicyGate::new(inbound("203.0.113.5"))
        .require(TrustedPeer)
        .build(&auth)
        .expect("listed peer");
    assert!(accepted.inbox_cap().is_some());

    let rejected = PolicyGate::new(inbound("203.0.113.9"))
        .require(TrustedPeer)
        .build(&auth)
        .unwrap_err();
    assert!(matches!(rejected.kind, ViolationKind::UntrustedPeer { .. }));

    let as_error: Error = rejected.into();
    assert!(as_error.to_string().starts_with("Policy violation: Untrusted peer"));
}

#[test]
fn serializer_omits_owner_restricted_values() {
    init_tracing();
    let mut item = Item::new("123456789/42");
    item.add_value(MetadataField::new("dc", "title", None), "On Repositories");
    item.add_owner("Alice Admin", "7");
    item.add_value(MetadataField::new("cris", "note", Some("curator")), "embargo pending")
        .security_level = Some(SecurityLevel::OWNER_ADMIN);
    item.add_value(MetadataField::new("cris", "note", Some("internal")), "level 1 only")
        .security_level = Some(SecurityLevel(1));

    let policy = VisibilityPolicy::new().with_level(
        SecurityLevel::OWNER_ADMIN,
        OwnerAdminEvaluator::new(AdminRoster::new(["7", "9"]), ItemMetadata),
    );

    let auth = authorizer_from("", StaticResolver::new());
    let ctx = PolicyGate::new(RequestMeta {
        request_id: "rest-1".to_string(),
        principal: Some(Principal::new("7", "Alice Admin")),
        remote_addr: "198.51.100.20".to_string(),
    })
    .require(Authenticated)
    .build(&auth)
    .expect("authenticated");

    let for_owner: Vec<&str> = policy
        .visible_values(ctx.principal(), &item)
        .unwrap()
        .iter()
        .map(|v| v.value.as_str())
        .collect();
    assert_eq!(
        for_owner,
        vec!["On Repositories", "Alice Admin", "embargo pending"]
    );

    let other_admin = Principal::new("9", "Other Admin");
    let for_other = policy.visible_values(Some(&other_admin), &item).unwrap();
    assert_eq!(for_other.len(), 2);

    let anonymous = policy.visible_values(None, &item).unwrap();
    assert_eq!(anonymous.len(), 2);
}

#[test]
fn authorizer_is_shareable_across_threads() {
    let auth = Arc::new(authorizer_from(
        "[ldn-trusted-services]\nlocalhost_default = true\nfrom_ip = \"203.0.113.5\"\n",
        StaticResolver::new(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let auth = Arc::clone(&auth);
            std::thread::spawn(move || {
                let remote = if i % 2 == 0 { "203.0.113.5" } else { "203.0.113.6" };
                auth.is_authorized(remote)
            })
        })
        .collect();

    let results: Vec<bool> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    assert_eq!(results, vec![true, false, true, false]);
}
