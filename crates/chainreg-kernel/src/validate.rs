//! Structural and referential validation of decoded chain records.
//!
//! Validators never fail; they return [`Finding`]s. Whether a finding blocks
//! the run is decided once, by [`apply_ignore_list`], against the set of
//! accepted messages.
//!
//! Per record, the first failing check is reported, in this precedence:
//!
//! 1. minimal population
//! 2. unique identity key
//! 3. asset naming (`name`/`symbol` differ from `id`, short symbol)
//! 4. asset supply fields
//! 5. asset entity reference
//! 6. asset verification transaction uniqueness
//!
//! Entity validation runs last for a chain and reports every referenced entity
//! name that is not defined.

use crate::chain::ChainRecords;
use crate::record::{Asset, NamingDefect, Record, RecordKind, MAX_SYMBOL_CHARS};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const RULE_RECORD_INCOMPLETE: &str = "record.incomplete";
pub const RULE_RECORD_DUPLICATE_ID: &str = "record.duplicate_id";
pub const RULE_ASSET_NAME_IS_ID: &str = "asset.name_is_id";
pub const RULE_ASSET_SYMBOL_IS_ID: &str = "asset.symbol_is_id";
pub const RULE_ASSET_SYMBOL_TOO_LONG: &str = "asset.symbol_too_long";
pub const RULE_ASSET_SUPPLY_CONFLICT: &str = "asset.supply_conflict";
pub const RULE_ASSET_SUPPLY_INVALID: &str = "asset.supply_invalid";
pub const RULE_ASSET_ENTITY_UNKNOWN: &str = "asset.entity_unknown";
pub const RULE_ASSET_VERIFICATION_TX_DUPLICATE: &str = "asset.verification_tx_duplicate";
pub const RULE_ENTITY_REFERENCE_MISSING: &str = "entity.reference_missing";

/// Verification transactions of permissioned exchanges, shared by many assets.
pub const PERMISSIONED_EXCHANGE_TXS: [&str; 2] = ["osmosis-main", "kujira-fin"];

/// Order in which a chain's kinds are validated. Entity comes last because it
/// reads every referencing kind.
pub const VALIDATION_ORDER: [RecordKind; 6] = [
    RecordKind::Account,
    RecordKind::Pool,
    RecordKind::Contract,
    RecordKind::Binary,
    RecordKind::Asset,
    RecordKind::Entity,
];

/// One validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub chain: String,
    pub kind: RecordKind,
    /// Identity key of the offending record (entity name for reference rules).
    pub key: String,
    pub rule: String,
    /// Full message; the ignore list matches against this text.
    pub message: String,
}

impl Finding {
    fn new(chain: &str, kind: RecordKind, key: &str, rule: &str, detail: String) -> Self {
        Self {
            chain: chain.to_string(),
            kind,
            key: key.to_string(),
            rule: rule.to_string(),
            message: format!("{chain}/{kind}: {detail}"),
        }
    }
}

/// Tunables for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Verification transactions exempt from the uniqueness rule.
    pub exempt_verification_txs: BTreeSet<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            exempt_verification_txs: PERMISSIONED_EXCHANGE_TXS
                .iter()
                .map(|tx| tx.to_string())
                .collect(),
        }
    }
}

impl ValidationPolicy {
    pub fn with_exempt_verification_txs<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_verification_txs
            .extend(extra.into_iter().map(Into::into));
        self
    }
}

/// Findings split by the ignore list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreOutcome {
    pub blocking: Vec<Finding>,
    pub ignored: Vec<Finding>,
}

impl IgnoreOutcome {
    pub fn accepted(&self) -> bool {
        self.blocking.is_empty()
    }
}

/// Split findings into blocking and ignored by exact message match.
pub fn apply_ignore_list(findings: Vec<Finding>, ignore: &BTreeSet<String>) -> IgnoreOutcome {
    let mut outcome = IgnoreOutcome::default();
    for finding in findings {
        if ignore.contains(&finding.message) {
            tracing::info!(message = %finding.message, "ignoring known validation error");
            outcome.ignored.push(finding);
        } else {
            outcome.blocking.push(finding);
        }
    }
    outcome
}

/// Validate every chain, one task per chain. Findings come back ordered by
/// chain, then validation order, then record order.
pub fn validate_registry(
    chains: &BTreeMap<String, ChainRecords>,
    policy: &ValidationPolicy,
) -> Vec<Finding> {
    let per_chain: Vec<Vec<Finding>> = chains
        .par_iter()
        .map(|(chain, records)| validate_chain(chain, records, policy))
        .collect();
    per_chain.into_iter().flatten().collect()
}

/// Validate one chain's records, all kinds.
pub fn validate_chain(
    chain: &str,
    records: &ChainRecords,
    policy: &ValidationPolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for kind in VALIDATION_ORDER {
        let kind_findings = match kind {
            RecordKind::Account => validate_plain(chain, records.accounts.as_deref()),
            RecordKind::Pool => validate_plain(chain, records.pools.as_deref()),
            RecordKind::Contract => validate_plain(chain, records.contracts.as_deref()),
            RecordKind::Binary => validate_plain(chain, records.binaries.as_deref()),
            RecordKind::Asset => validate_assets(chain, records, policy),
            RecordKind::Entity => validate_entities(chain, records),
        };
        if !kind_findings.is_empty() {
            tracing::debug!(chain, %kind, count = kind_findings.len(), "validation findings");
        }
        findings.extend(kind_findings);
    }
    findings
}

fn validate_plain<T: Record>(chain: &str, records: Option<&[T]>) -> Vec<Finding> {
    match records {
        Some(records) => check_records(chain, records, |_, _| None),
        None => Vec::new(),
    }
}

/// Population and uniqueness checks, then `extra` for records passing both.
/// `extra` receives the record's position in `records`.
fn check_records<T, F>(chain: &str, records: &[T], mut extra: F) -> Vec<Finding>
where
    T: Record,
    F: FnMut(usize, &T) -> Option<(&'static str, String)>,
{
    let field = T::KIND.identity_field();
    let mut seen = HashSet::with_capacity(records.len());
    let mut findings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let key = record.identity_key();
        let duplicate = !key.is_empty() && !seen.insert(key);

        let defect = if let Some(missing) = record.missing_field() {
            Some((
                RULE_RECORD_INCOMPLETE,
                format!("{field} {key:?} is missing or has malformed `{missing}`"),
            ))
        } else if duplicate {
            Some((RULE_RECORD_DUPLICATE_ID, format!("duplicate {field} {key:?}")))
        } else {
            extra(index, record)
        };

        if let Some((rule, detail)) = defect {
            findings.push(Finding::new(chain, T::KIND, key, rule, detail));
        }
    }
    findings
}

fn validate_assets(
    chain: &str,
    records: &ChainRecords,
    policy: &ValidationPolicy,
) -> Vec<Finding> {
    let Some(assets) = records.assets.as_deref() else {
        return Vec::new();
    };
    let entities = records.entity_names();

    // Every holder registers its transaction, whatever else is wrong with it.
    let mut verification_txs = HashSet::new();
    let reuses_tx: Vec<bool> = assets
        .iter()
        .map(|asset| {
            let tx = asset.verification_tx.as_str();
            !tx.is_empty()
                && !policy.exempt_verification_txs.contains(tx)
                && !verification_txs.insert(tx)
        })
        .collect();

    check_records(chain, assets, |index, asset: &Asset| {
        naming_defect(asset)
            .or_else(|| supply_defect(asset))
            .or_else(|| entity_defect(asset, &entities))
            .or_else(|| {
                reuses_tx[index].then(|| {
                    (
                        RULE_ASSET_VERIFICATION_TX_DUPLICATE,
                        format!(
                            "id {:?} reuses verification_tx {:?}",
                            asset.id, asset.verification_tx
                        ),
                    )
                })
            })
    })
}

fn naming_defect(asset: &Asset) -> Option<(&'static str, String)> {
    let id = &asset.id;
    asset.naming_defect().map(|defect| match defect {
        NamingDefect::NameIsId => (RULE_ASSET_NAME_IS_ID, format!("id {id:?} is used as name")),
        NamingDefect::SymbolIsId => (
            RULE_ASSET_SYMBOL_IS_ID,
            format!("id {id:?} is used as symbol"),
        ),
        NamingDefect::SymbolTooLong { chars } => (
            RULE_ASSET_SYMBOL_TOO_LONG,
            format!(
                "id {id:?} has symbol {:?} longer than {MAX_SYMBOL_CHARS} characters ({chars})",
                asset.symbol
            ),
        ),
    })
}

fn is_positive_number(value: &str) -> bool {
    value
        .parse::<f64>()
        .is_ok_and(|number| number.is_finite() && number > 0.0)
}

fn supply_defect(asset: &Asset) -> Option<(&'static str, String)> {
    let pairs = [
        ("circ_supply", &asset.circ_supply, &asset.circ_supply_api),
        ("total_supply", &asset.total_supply, &asset.total_supply_api),
    ];
    for (field, value, api) in pairs {
        if !value.is_empty() && !api.is_empty() {
            return Some((
                RULE_ASSET_SUPPLY_CONFLICT,
                format!("id {:?} sets both {field} and {field}_api", asset.id),
            ));
        }
        if !value.is_empty() && !is_positive_number(value) {
            return Some((
                RULE_ASSET_SUPPLY_INVALID,
                format!(
                    "id {:?} has {field} {value:?}, expected a positive number",
                    asset.id
                ),
            ));
        }
    }
    None
}

fn entity_defect(asset: &Asset, entities: &BTreeSet<&str>) -> Option<(&'static str, String)> {
    let entity = asset.entity_ref()?;
    if entities.contains(entity) {
        return None;
    }
    Some((
        RULE_ASSET_ENTITY_UNKNOWN,
        format!("id {:?} references unknown entity {entity:?}", asset.id),
    ))
}

fn validate_entities(chain: &str, records: &ChainRecords) -> Vec<Finding> {
    let mut findings = match records.entities.as_deref() {
        Some(entities) => check_records(chain, entities, |_, _| None),
        None => Vec::new(),
    };

    let defined = records.entity_names();
    for (name, kinds) in records.entity_references() {
        if defined.contains(name) {
            continue;
        }
        let referrers = kinds
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(Finding::new(
            chain,
            RecordKind::Entity,
            name,
            RULE_ENTITY_REFERENCE_MISSING,
            format!("name {name:?} is referenced by {referrers} but not defined"),
        ));
    }
    findings
}
