//! Discovery: find record files and group them into per-chain bundles.
//!
//! A record file is any file whose base name is exactly one of the canonical
//! kind file names (`asset.json`, ...). Its chain is the name of the directory
//! holding it.

use chainreg_kernel::RecordKind;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names never descended into.
const SKIPPED_DIRS: [&str; 2] = ["target", "node_modules"];

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to walk {path}: {message}")]
    Walk { path: String, message: String },

    #[error("{path}: unrecognized record file name (expected one of: {expected})")]
    UnrecognizedKind { path: String, expected: String },

    #[error("{path}: record file has no chain directory")]
    NoChainDirectory { path: String },

    #[error("chain {chain:?} has two {kind} files: {first} and {second}")]
    DuplicateKind {
        chain: String,
        kind: RecordKind,
        first: String,
        second: String,
    },
}

/// The record files of one chain, at most one per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBundle {
    chain: String,
    files: BTreeMap<RecordKind, PathBuf>,
}

impl ResourceBundle {
    pub fn new(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn path(&self, kind: RecordKind) -> Option<&Path> {
        self.files.get(&kind).map(PathBuf::as_path)
    }

    pub fn files(&self) -> impl Iterator<Item = (RecordKind, &Path)> {
        self.files.iter().map(|(kind, path)| (*kind, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, kind: RecordKind, path: PathBuf) -> Result<(), DiscoveryError> {
        if let Some(first) = self.files.get(&kind) {
            return Err(DiscoveryError::DuplicateKind {
                chain: self.chain.clone(),
                kind,
                first: first.display().to_string(),
                second: path.display().to_string(),
            });
        }
        self.files.insert(kind, path);
        Ok(())
    }
}

/// Every record file under `root`, sorted.
///
/// Hidden directories and build output directories are skipped.
pub fn discover_record_files(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut found = Vec::new();
    walk(root, &mut found)?;
    found.sort();
    tracing::debug!(root = %root.display(), files = found.len(), "discovered record files");
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), DiscoveryError> {
    let walk_error = |e: std::io::Error| DiscoveryError::Walk {
        path: dir.display().to_string(),
        message: e.to_string(),
    };
    for entry in fs::read_dir(dir).map_err(walk_error)? {
        let entry = entry.map_err(walk_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(walk_error)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk(&path, found)?;
        } else if file_type.is_file() && RecordKind::from_file_name(&name).is_some() {
            found.push(path);
        }
    }
    Ok(())
}

/// Group record file paths by chain.
///
/// Fails on the first path whose base name is not a canonical kind file name,
/// which has no parent directory, or which repeats a kind for its chain.
pub fn group_by_chain<P: AsRef<Path>>(
    paths: &[P],
) -> Result<BTreeMap<String, ResourceBundle>, DiscoveryError> {
    let mut bundles: BTreeMap<String, ResourceBundle> = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let kind = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(RecordKind::from_file_name)
            .ok_or_else(|| DiscoveryError::UnrecognizedKind {
                path: path.display().to_string(),
                expected: RecordKind::ALL
                    .iter()
                    .map(|kind| kind.file_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        let chain = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DiscoveryError::NoChainDirectory {
                path: path.display().to_string(),
            })?;

        bundles
            .entry(chain.to_string())
            .or_insert_with(|| ResourceBundle::new(chain))
            .insert(kind, path.to_path_buf())?;
    }
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "chainreg-discover-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp root should be created");
        path
    }

    #[test]
    fn groups_by_parent_directory() {
        let paths = vec![
            PathBuf::from("registry/osmosis/asset.json"),
            PathBuf::from("registry/osmosis/entity.json"),
            PathBuf::from("registry/terra/pool.json"),
        ];

        let bundles = group_by_chain(&paths).expect("grouping should succeed");

        assert_eq!(bundles.keys().collect::<Vec<_>>(), vec!["osmosis", "terra"]);
        let osmosis = &bundles["osmosis"];
        assert_eq!(osmosis.len(), 2);
        assert_eq!(
            osmosis.path(RecordKind::Asset),
            Some(Path::new("registry/osmosis/asset.json"))
        );
        assert_eq!(osmosis.path(RecordKind::Pool), None);
    }

    #[test]
    fn chain_named_like_a_kind_is_not_a_kind() {
        let paths = vec![PathBuf::from("contract-chain/asset.json")];
        let bundles = group_by_chain(&paths).expect("grouping should succeed");
        let bundle = &bundles["contract-chain"];
        assert_eq!(
            bundle.files().map(|(kind, _)| kind).collect::<Vec<_>>(),
            vec![RecordKind::Asset]
        );
    }

    #[test]
    fn unrecognized_file_name_is_fatal() {
        let paths = vec![PathBuf::from("osmosis/assets.json")];
        let err = group_by_chain(&paths).expect_err("unknown kind must fail");
        assert!(matches!(err, DiscoveryError::UnrecognizedKind { .. }));
        assert!(err.to_string().contains("osmosis/assets.json"));
    }

    #[test]
    fn file_without_chain_directory_is_fatal() {
        let err = group_by_chain(&[PathBuf::from("asset.json")])
            .expect_err("missing chain directory must fail");
        assert!(matches!(err, DiscoveryError::NoChainDirectory { .. }));
    }

    #[test]
    fn duplicate_kind_for_one_chain_is_fatal() {
        let paths = vec![
            PathBuf::from("a/osmosis/asset.json"),
            PathBuf::from("b/osmosis/asset.json"),
        ];
        let err = group_by_chain(&paths).expect_err("duplicate kind must fail");
        assert!(matches!(
            err,
            DiscoveryError::DuplicateKind {
                kind: RecordKind::Asset,
                ..
            }
        ));
    }

    #[test]
    fn walk_finds_exact_names_and_skips_hidden_dirs() {
        let root = temp_root("walk");
        for dir in ["osmosis", "terra", ".git/objects", "target/debug"] {
            fs::create_dir_all(root.join(dir)).expect("dir should be created");
        }
        for file in [
            "osmosis/asset.json",
            "osmosis/entity.json",
            "osmosis/my_asset.json",
            "osmosis/notes.txt",
            "terra/pool.json",
            ".git/objects/asset.json",
            "target/debug/asset.json",
        ] {
            fs::write(root.join(file), "[]\n").expect("file should be written");
        }

        let found = discover_record_files(&root).expect("walk should succeed");

        let relative: Vec<String> = found
            .iter()
            .map(|path| {
                path.strip_prefix(&root)
                    .expect("path under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(
            relative,
            vec!["osmosis/asset.json", "osmosis/entity.json", "terra/pool.json"]
        );

        let _ = fs::remove_dir_all(root);
    }
}
