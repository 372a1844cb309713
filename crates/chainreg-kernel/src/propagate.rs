//! Cross-chain propagation of native display metadata.
//!
//! Bridged assets are created independently on every chain and do not carry
//! authoritative naming. Their `name`, `symbol` and `icon` are copied from the
//! asset they declare as origin (`origin_chain`/`origin_id`).
//!
//! Resolution is single-hop: an asset is resolved against its declared origin
//! only, never through a chain of bridges.
//!
//! ```text
//! read phase   (parallel per chain, immutable view)  → plans
//! write phase  (sequential)                          → apply plans
//! ```

use crate::record::Asset;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Every tracked chain's asset list, keyed by chain identifier.
pub type ChainAssets = BTreeMap<String, Vec<Asset>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropagationError {
    /// A tracked origin chain has no asset with the declared origin id.
    #[error(
        "{chain}/asset: origin asset {origin_id:?} not found on chain {origin_chain:?} (declared by {asset_id:?})"
    )]
    MissingOrigin {
        chain: String,
        asset_id: String,
        origin_chain: String,
        origin_id: String,
    },
}

/// A bridged asset whose display fields were rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagatedAsset {
    pub chain: String,
    pub asset_id: String,
    pub origin_chain: String,
    pub origin_id: String,
}

/// A bridged asset left untouched because its origin chain is not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOrigin {
    pub chain: String,
    pub asset_id: String,
    pub origin_chain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationReport {
    /// Bridged assets resolved against a tracked origin.
    pub resolved: usize,
    /// Resolved assets whose display fields changed.
    pub updated: Vec<PropagatedAsset>,
    pub skipped: Vec<SkippedOrigin>,
}

impl PropagationReport {
    pub fn changed_chains(&self) -> BTreeSet<&str> {
        self.updated.iter().map(|a| a.chain.as_str()).collect()
    }
}

struct DisplayFields {
    index: usize,
    name: String,
    symbol: String,
    icon: String,
}

#[derive(Default)]
struct ChainPlan {
    displays: Vec<DisplayFields>,
    skipped: Vec<SkippedOrigin>,
}

type OriginIndex<'a> = BTreeMap<&'a str, HashMap<&'a str, &'a Asset>>;

fn index_origins(chains: &ChainAssets) -> OriginIndex<'_> {
    chains
        .iter()
        .map(|(chain, assets)| {
            let mut by_id = HashMap::with_capacity(assets.len());
            for asset in assets {
                // First occurrence wins; duplicates are a validation concern.
                by_id.entry(asset.id.as_str()).or_insert(asset);
            }
            (chain.as_str(), by_id)
        })
        .collect()
}

fn plan_chain(
    chain: &str,
    assets: &[Asset],
    origins: &OriginIndex<'_>,
) -> Result<ChainPlan, PropagationError> {
    let mut plan = ChainPlan::default();
    for (index, asset) in assets.iter().enumerate() {
        if !asset.is_bridged() {
            continue;
        }

        let Some(origin_assets) = origins.get(asset.origin_chain.as_str()) else {
            tracing::warn!(
                chain,
                asset = %asset.id,
                origin_chain = %asset.origin_chain,
                "origin chain not tracked, skipping propagation"
            );
            plan.skipped.push(SkippedOrigin {
                chain: chain.to_string(),
                asset_id: asset.id.clone(),
                origin_chain: asset.origin_chain.clone(),
            });
            continue;
        };

        let root = origin_assets
            .get(asset.origin_id.as_str())
            .ok_or_else(|| PropagationError::MissingOrigin {
                chain: chain.to_string(),
                asset_id: asset.id.clone(),
                origin_chain: asset.origin_chain.clone(),
                origin_id: asset.origin_id.clone(),
            })?;

        plan.displays.push(DisplayFields {
            index,
            name: root.name.clone(),
            symbol: root.symbol.clone(),
            icon: root.icon.clone(),
        });
    }
    Ok(plan)
}

/// Copy `name`, `symbol` and `icon` from each bridged asset's origin.
///
/// Untracked origin chains are logged and skipped. A tracked origin chain
/// missing the declared origin id aborts with [`PropagationError`] and leaves
/// `chains` unmodified.
pub fn propagate(chains: &mut ChainAssets) -> Result<PropagationReport, PropagationError> {
    let plans = {
        let origins = index_origins(chains);
        let planned: Vec<(String, Result<ChainPlan, PropagationError>)> = chains
            .par_iter()
            .map(|(chain, assets)| (chain.clone(), plan_chain(chain, assets, &origins)))
            .collect();

        let mut plans = Vec::with_capacity(planned.len());
        for (chain, plan) in planned {
            plans.push((chain, plan?));
        }
        plans
    };

    let mut report = PropagationReport::default();
    for (chain, plan) in plans {
        report.skipped.extend(plan.skipped);
        let Some(assets) = chains.get_mut(&chain) else {
            continue;
        };
        for display in plan.displays {
            report.resolved += 1;
            let asset = &mut assets[display.index];
            if asset.name == display.name
                && asset.symbol == display.symbol
                && asset.icon == display.icon
            {
                continue;
            }
            tracing::debug!(
                chain = %chain,
                asset = %asset.id,
                origin = %asset.origin_id,
                "propagating native display fields"
            );
            asset.name = display.name;
            asset.symbol = display.symbol;
            asset.icon = display.icon;
            report.updated.push(PropagatedAsset {
                chain: chain.clone(),
                asset_id: asset.id.clone(),
                origin_chain: asset.origin_chain.clone(),
                origin_id: asset.origin_id.clone(),
            });
        }
    }

    Ok(report)
}
