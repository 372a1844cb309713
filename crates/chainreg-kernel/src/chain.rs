//! One chain's decoded records, all kinds side by side.

use crate::order::sort_records;
use crate::record::{Account, Asset, Binary, Contract, Entity, Pool, Record, RecordKind};
use std::collections::{BTreeMap, BTreeSet};

/// Decoded records of one chain. `None` means the chain has no file of that
/// kind, which is distinct from an empty file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRecords {
    pub accounts: Option<Vec<Account>>,
    pub assets: Option<Vec<Asset>>,
    pub binaries: Option<Vec<Binary>>,
    pub contracts: Option<Vec<Contract>>,
    pub entities: Option<Vec<Entity>>,
    pub pools: Option<Vec<Pool>>,
}

impl ChainRecords {
    /// Kinds present for this chain.
    pub fn kinds(&self) -> Vec<RecordKind> {
        let present = [
            (RecordKind::Account, self.accounts.is_some()),
            (RecordKind::Asset, self.assets.is_some()),
            (RecordKind::Binary, self.binaries.is_some()),
            (RecordKind::Contract, self.contracts.is_some()),
            (RecordKind::Entity, self.entities.is_some()),
            (RecordKind::Pool, self.pools.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(kind, is_present)| is_present.then_some(kind))
            .collect()
    }

    /// Names of every entity defined in this chain's entity file.
    pub fn entity_names(&self) -> BTreeSet<&str> {
        self.entities
            .iter()
            .flatten()
            .map(|entity| entity.name.as_str())
            .collect()
    }

    /// Every non-empty entity name referenced by accounts, assets, binaries
    /// and contracts, with the kinds that reference it.
    pub fn entity_references(&self) -> BTreeMap<&str, BTreeSet<RecordKind>> {
        let mut refs: BTreeMap<&str, BTreeSet<RecordKind>> = BTreeMap::new();
        collect_refs(&mut refs, self.accounts.as_deref());
        collect_refs(&mut refs, self.assets.as_deref());
        collect_refs(&mut refs, self.binaries.as_deref());
        collect_refs(&mut refs, self.contracts.as_deref());
        refs
    }

    /// Put every present kind into enforced order.
    pub fn sort_all(&mut self) {
        sort_present(&mut self.accounts);
        sort_present(&mut self.assets);
        sort_present(&mut self.binaries);
        sort_present(&mut self.contracts);
        sort_present(&mut self.entities);
        sort_present(&mut self.pools);
    }
}

fn collect_refs<'a, T: Record>(
    refs: &mut BTreeMap<&'a str, BTreeSet<RecordKind>>,
    records: Option<&'a [T]>,
) {
    for record in records.into_iter().flatten() {
        if let Some(entity) = record.entity_ref() {
            refs.entry(entity).or_default().insert(T::KIND);
        }
    }
}

fn sort_present<T: crate::order::EnforcedOrder>(records: &mut Option<Vec<T>>) {
    if let Some(records) = records {
        sort_records(records);
    }
}
