//! The phase pipeline: discover, load, propagate, sort, persist, reload,
//! validate, then split findings by the ignore list.
//!
//! Phases run strictly one after another. Within a phase work fans out per
//! chain (or per file for writes) and joins before the next phase starts.

use chainreg_kernel::{
    Finding, PropagationError, RecordKind, SkippedOrigin, ValidationPolicy, apply_ignore_list,
    validate_registry,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::codec::CodecError;
use crate::config::{ConfigError, RegistryConfig};
use crate::discover::{DiscoveryError, discover_record_files, group_by_chain};
use crate::registry::{FileChange, Registry};

pub const RUN_REPORT_KIND: &str = "chainreg.run.v1";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phases {
    /// Everything.
    Run,
    /// Propagation, then persist asset files.
    Propagate,
    /// Sort, then persist every kind.
    Sort,
    /// Validation only; nothing is written.
    Validate,
}

impl Phases {
    fn propagates(self) -> bool {
        matches!(self, Self::Run | Self::Propagate)
    }

    fn sorts(self) -> bool {
        matches!(self, Self::Run | Self::Sort)
    }

    fn validates(self) -> bool {
        matches!(self, Self::Run | Self::Validate)
    }

    fn persisted_kinds(self) -> &'static [RecordKind] {
        match self {
            Self::Run | Self::Sort => &RecordKind::ALL,
            Self::Propagate => &[RecordKind::Asset],
            Self::Validate => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    /// Explicit record files; `None` walks `root`.
    pub files: Option<Vec<PathBuf>>,
    pub phases: Phases,
    /// Report non-canonical files instead of rewriting them.
    pub check_only: bool,
    pub ignore: BTreeSet<String>,
    pub policy: ValidationPolicy,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>, phases: Phases) -> Self {
        Self {
            root: root.into(),
            files: None,
            phases,
            check_only: false,
            ignore: BTreeSet::new(),
            policy: ValidationPolicy::default(),
        }
    }

    /// Options with `<root>/chainreg.toml` applied. The ignore list is only
    /// loaded when the phases include validation.
    pub fn configured(
        root: impl Into<PathBuf>,
        phases: Phases,
        explicit_ignore: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut options = Self::new(root, phases);
        let config = RegistryConfig::load(&options.root)?;
        options.policy = config.validation_policy();
        if phases.validates() {
            options.ignore = config.resolve_ignore_list(&options.root, explicit_ignore)?;
        }
        Ok(options)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub check_kind: &'static str,
    pub phase: Phases,
    pub result: &'static str,
    pub root: String,
    pub check_only: bool,
    pub chain_count: usize,
    pub file_count: usize,
    pub propagated: usize,
    pub skipped_origins: Vec<SkippedOrigin>,
    pub rewritten: Vec<FileChange>,
    pub stale: Vec<FileChange>,
    pub findings: Vec<Finding>,
    pub ignored: Vec<Finding>,
}

impl RunReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

/// Execute the configured phases against the registry under `options.root`.
///
/// Fatal errors (discovery, decoding, a missing propagation origin, writes)
/// abort the run. Validation findings do not; they decide `result`.
pub fn run(options: &RunOptions) -> Result<RunReport, PipelineError> {
    let files = match &options.files {
        Some(files) => files.clone(),
        None => discover_record_files(&options.root)?,
    };
    let bundles = group_by_chain(&files)?;
    let mut registry = Registry::load(bundles)?;

    let mut propagated = 0;
    let mut skipped_origins = Vec::new();
    if options.phases.propagates() {
        let report = registry.propagate()?;
        tracing::info!(
            resolved = report.resolved,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            chains = ?report.changed_chains(),
            "propagated display metadata"
        );
        propagated = report.updated.len();
        skipped_origins = report.skipped;
    }

    if options.phases.sorts() {
        registry.sort_all();
    }

    let persisted = registry.persist(options.phases.persisted_kinds(), options.check_only)?;

    let mut findings = Vec::new();
    let mut ignored = Vec::new();
    if options.phases.validates() {
        let reloaded;
        let validated = if options.check_only || persisted.rewritten.is_empty() {
            &registry
        } else {
            reloaded = registry.reload()?;
            &reloaded
        };
        let outcome = apply_ignore_list(
            validate_registry(validated.chains(), &options.policy),
            &options.ignore,
        );
        findings = outcome.blocking;
        ignored = outcome.ignored;
    }

    let accepted = findings.is_empty() && persisted.stale.is_empty();
    let report = RunReport {
        check_kind: RUN_REPORT_KIND,
        phase: options.phases,
        result: if accepted { "accepted" } else { "rejected" },
        root: options.root.display().to_string(),
        check_only: options.check_only,
        chain_count: registry.chain_count(),
        file_count: registry.file_count(),
        propagated,
        skipped_origins,
        rewritten: persisted.rewritten,
        stale: persisted.stale,
        findings,
        ignored,
    };
    tracing::info!(
        result = report.result,
        findings = report.findings.len(),
        ignored = report.ignored.len(),
        rewritten = report.rewritten.len(),
        stale = report.stale.len(),
        "pipeline finished"
    );
    Ok(report)
}
