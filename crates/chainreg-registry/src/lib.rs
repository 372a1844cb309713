//! # chainreg registry
//!
//! Everything between the kernel's pure rules and the disk: finding record
//! files, decoding and canonically re-encoding them, the optional
//! `chainreg.toml`, the ignore list, and the phase pipeline that ties them
//! together.
//!
//! ```text
//! discover ─► group ─► load ─► propagate ─► sort ─► persist ─► reload ─► validate ─► ignore
//! ```

pub mod codec;
pub mod config;
pub mod discover;
pub mod ignore;
pub mod pipeline;
pub mod registry;

pub use codec::{
    CodecError, LoadedRecords, digest_bytes, read_records_from_path, render_records,
    write_bytes_atomically,
};
pub use config::{CONFIG_FILE_NAME, ConfigError, DEFAULT_IGNORE_FILE, RegistryConfig};
pub use discover::{DiscoveryError, ResourceBundle, discover_record_files, group_by_chain};
pub use ignore::{load_ignore_list, parse_ignore_list};
pub use pipeline::{PipelineError, Phases, RUN_REPORT_KIND, RunOptions, RunReport, run};
pub use registry::{FileChange, PersistOutcome, Registry};
