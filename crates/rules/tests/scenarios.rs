//! End-to-end evaluation against the example definitions in
//! `data/rules/examples/`, through the public API only.

use kinetix_core::{AccountGroup, AccountUser, InMemoryAccountStore};
use kinetix_rules::loader::{LoadStatus, RuleLoader};
use kinetix_rules::{RuleContext, RuleManager, RuleValue};
use serde::Serialize;

/// Integration tests run from the crate directory, so we go up two levels.
fn examples_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules/examples")
}

#[derive(Serialize)]
struct PurchaseOrder {
    status: &'static str,
    amount: f64,
    region: &'static str,
    categories: Vec<&'static str>,
}

fn order(amount: f64, region: &'static str) -> PurchaseOrder {
    PurchaseOrder {
        status: "OPEN",
        amount,
        region,
        categories: vec!["office"],
    }
}

fn user(id: &str) -> AccountUser {
    AccountUser {
        id: id.to_string(),
        display_name: id.to_string(),
        email: Some(format!("{}@example.com", id)),
    }
}

fn group(id: &str, members: &[&str]) -> AccountGroup {
    AccountGroup {
        id: id.to_string(),
        name: id.to_string(),
        account_ids: members.iter().map(|m| m.to_string()).collect(),
    }
}

fn accounts() -> InMemoryAccountStore {
    InMemoryAccountStore::from_parts(
        vec![user("anna"), user("bert"), user("fin")],
        vec![
            group("regional-managers", &["anna", "bert"]),
            group("finance", &["fin", "anna"]),
            group("compliance", &[]),
        ],
    )
}

fn manager() -> RuleManager<std::sync::Arc<kinetix_rules::loader::RuleCatalog>, InMemoryAccountStore> {
    let loader = RuleLoader::new(examples_dir());
    let results = loader.load_all().expect("scan examples");
    for r in &results {
        assert!(
            matches!(r.status, LoadStatus::Loaded { errors: 0, .. }),
            "{}: {:?}",
            r.path.display(),
            r.status
        );
    }
    RuleManager::new(loader.catalog(), accounts())
}

fn ids(users: &[AccountUser]) -> Vec<&str> {
    users.iter().map(|u| u.id.as_str()).collect()
}

#[test]
fn threshold_rule_needs_strictly_greater_amount() {
    let m = manager();
    for (amount, expected) in [(999.0, false), (1000.0, false), (1001.0, true)] {
        let ctx = m.context_for(&order(amount, "EU"), 1).unwrap();
        assert_eq!(m.is_rule_valid(10, &ctx).unwrap(), expected, "amount {}", amount);
    }
}

#[test]
fn regional_and_finance_selectors_both_contribute() {
    let m = manager();
    let ctx = m.context_for(&order(5000.0, "EU"), 1).unwrap();
    // anna appears once per matching selector
    assert_eq!(ids(&m.select_accounts(10, &ctx).unwrap()), vec!["anna", "bert", "anna", "fin"]);

    let ctx = m.context_for(&order(5000.0, "ASIA"), 1).unwrap();
    assert_eq!(ids(&m.select_accounts(10, &ctx).unwrap()), vec!["anna", "fin"]);
}

#[test]
fn list_field_matches_in_operator() {
    let m = manager();
    let mut po = order(10.0, "EU");
    po.categories = vec!["office", "chemicals"];
    let ctx = m.context_for(&po, 1).unwrap();
    assert!(m.is_rule_valid(11, &ctx).unwrap());
    // compliance group is empty
    assert!(m.select_accounts(11, &ctx).unwrap().is_empty());
}

#[test]
fn activity_without_rules_never_requires_validation() {
    let m = manager();
    let ctx = m.context_for(&order(1_000_000.0, "EU"), 1).unwrap();
    assert!(!m.is_rule_valid(12, &ctx).unwrap());
}

#[test]
fn constants_reach_the_context() {
    let m = manager();
    let ctx = m.context_for(&order(1.0, "EU"), 1).unwrap();
    assert_eq!(ctx.get("currency"), Some(&RuleValue::text("EUR")));
    assert_eq!(m.get_constants(2).unwrap().len(), 0);
}

#[test]
fn hand_built_context_matches_serialized_one() {
    let m = manager();
    let ctx: RuleContext = [
        ("status", RuleValue::text("OPEN")),
        ("amount", RuleValue::number(1500)),
    ]
    .into_iter()
    .collect();
    assert!(m.is_rule_valid(10, &ctx).unwrap());

    let batch = m.preload([10, 11, 12], [1]).unwrap();
    assert!(m.is_rule_valid_in(&batch, 10, &ctx).unwrap());
}
