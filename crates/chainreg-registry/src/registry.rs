//! In-memory registry: every chain's records plus the digests of the files
//! they came from.

use chainreg_kernel::{
    ChainAssets, ChainRecords, PropagationError, PropagationReport, Record, RecordKind, propagate,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::codec::{
    CodecError, LoadedRecords, digest_bytes, read_records_from_path, render_records,
    write_bytes_atomically,
};
use crate::discover::ResourceBundle;

/// A record file whose canonical bytes differ from what is on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub chain: String,
    pub kind: RecordKind,
    pub path: PathBuf,
    /// SHA-256 of the canonical bytes.
    pub digest: String,
}

/// Result of a persist pass. In check mode `rewritten` stays empty and every
/// differing file lands in `stale`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub rewritten: Vec<FileChange>,
    pub stale: Vec<FileChange>,
}

struct RenderedFile {
    change: FileChange,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    bundles: BTreeMap<String, ResourceBundle>,
    chains: BTreeMap<String, ChainRecords>,
    digests: BTreeMap<PathBuf, String>,
}

impl Registry {
    /// Decode every file of every bundle, one task per chain.
    ///
    /// The first decode error in chain order aborts the load.
    pub fn load(bundles: BTreeMap<String, ResourceBundle>) -> Result<Self, CodecError> {
        let loaded: Vec<(String, Result<LoadedChain, CodecError>)> = bundles
            .par_iter()
            .map(|(chain, bundle)| (chain.clone(), load_chain(bundle)))
            .collect();

        let mut chains = BTreeMap::new();
        let mut digests = BTreeMap::new();
        for (chain, result) in loaded {
            let LoadedChain {
                records,
                digests: chain_digests,
            } = result?;
            chains.insert(chain, records);
            digests.extend(chain_digests);
        }

        tracing::info!(
            chains = chains.len(),
            files = digests.len(),
            "loaded registry"
        );
        Ok(Self {
            bundles,
            chains,
            digests,
        })
    }

    /// Re-read every file this registry was loaded from.
    pub fn reload(&self) -> Result<Self, CodecError> {
        Self::load(self.bundles.clone())
    }

    pub fn chains(&self) -> &BTreeMap<String, ChainRecords> {
        &self.chains
    }

    pub fn chain(&self, name: &str) -> Option<&ChainRecords> {
        self.chains.get(name)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn file_count(&self) -> usize {
        self.bundles.values().map(ResourceBundle::len).sum()
    }

    /// Propagate native display metadata to bridged assets across all chains.
    ///
    /// On error no asset is modified.
    pub fn propagate(&mut self) -> Result<PropagationReport, PropagationError> {
        let mut assets: ChainAssets = self
            .chains
            .iter_mut()
            .filter_map(|(chain, records)| records.assets.take().map(|list| (chain.clone(), list)))
            .collect();

        let result = propagate(&mut assets);

        for (chain, list) in assets {
            if let Some(records) = self.chains.get_mut(&chain) {
                records.assets = Some(list);
            }
        }
        result
    }

    /// Put every kind of every chain into enforced order, one task per chain.
    pub fn sort_all(&mut self) {
        self.chains
            .par_iter_mut()
            .for_each(|(_, records)| records.sort_all());
    }

    /// Write the canonical form of every file of the given kinds whose bytes
    /// changed since it was loaded. Renders one task per chain and writes one
    /// task per file.
    pub fn persist(
        &mut self,
        kinds: &[RecordKind],
        check_only: bool,
    ) -> Result<PersistOutcome, CodecError> {
        let rendered: Vec<Result<Vec<RenderedFile>, CodecError>> = self
            .bundles
            .par_iter()
            .map(|(chain, bundle)| match self.chains.get(chain) {
                Some(records) => render_chain(bundle, records, kinds),
                None => Ok(Vec::new()),
            })
            .collect();

        let mut changed = Vec::new();
        for files in rendered {
            changed.extend(files?.into_iter().filter(|file| {
                self.digests.get(&file.change.path) != Some(&file.change.digest)
            }));
        }

        let mut outcome = PersistOutcome::default();
        if check_only {
            for file in changed {
                tracing::warn!(path = %file.change.path.display(), "record file is not canonical");
                outcome.stale.push(file.change);
            }
            return Ok(outcome);
        }

        let written: Vec<Result<(), CodecError>> = changed
            .par_iter()
            .map(|file| write_bytes_atomically(&file.change.path, &file.bytes))
            .collect();
        for result in written {
            result?;
        }

        for file in changed {
            tracing::info!(path = %file.change.path.display(), "rewrote record file");
            self.digests
                .insert(file.change.path.clone(), file.change.digest.clone());
            outcome.rewritten.push(file.change);
        }
        Ok(outcome)
    }
}

struct LoadedChain {
    records: ChainRecords,
    digests: Vec<(PathBuf, String)>,
}

fn load_chain(bundle: &ResourceBundle) -> Result<LoadedChain, CodecError> {
    let mut loaded = LoadedChain {
        records: ChainRecords::default(),
        digests: Vec::new(),
    };
    for (kind, path) in bundle.files() {
        let records = &mut loaded.records;
        let digest = match kind {
            RecordKind::Account => load_kind(path, &mut records.accounts)?,
            RecordKind::Asset => load_kind(path, &mut records.assets)?,
            RecordKind::Binary => load_kind(path, &mut records.binaries)?,
            RecordKind::Contract => load_kind(path, &mut records.contracts)?,
            RecordKind::Entity => load_kind(path, &mut records.entities)?,
            RecordKind::Pool => load_kind(path, &mut records.pools)?,
        };
        loaded.digests.push((path.to_path_buf(), digest));
    }
    tracing::debug!(chain = bundle.chain(), files = bundle.len(), "loaded chain");
    Ok(loaded)
}

fn load_kind<T: Record>(path: &Path, slot: &mut Option<Vec<T>>) -> Result<String, CodecError> {
    let LoadedRecords { records, digest } = read_records_from_path::<T>(path)?;
    *slot = Some(records);
    Ok(digest)
}

fn render_chain(
    bundle: &ResourceBundle,
    records: &ChainRecords,
    kinds: &[RecordKind],
) -> Result<Vec<RenderedFile>, CodecError> {
    let mut files = Vec::new();
    for (kind, path) in bundle.files() {
        if !kinds.contains(&kind) {
            continue;
        }
        let bytes = match kind {
            RecordKind::Account => render_present(records.accounts.as_deref())?,
            RecordKind::Asset => render_present(records.assets.as_deref())?,
            RecordKind::Binary => render_present(records.binaries.as_deref())?,
            RecordKind::Contract => render_present(records.contracts.as_deref())?,
            RecordKind::Entity => render_present(records.entities.as_deref())?,
            RecordKind::Pool => render_present(records.pools.as_deref())?,
        };
        let Some(bytes) = bytes else {
            continue;
        };
        files.push(RenderedFile {
            change: FileChange {
                chain: bundle.chain().to_string(),
                kind,
                path: path.to_path_buf(),
                digest: digest_bytes(&bytes),
            },
            bytes,
        });
    }
    Ok(files)
}

fn render_present<T: Serialize>(records: Option<&[T]>) -> Result<Option<Vec<u8>>, CodecError> {
    records.map(render_records).transpose()
}
