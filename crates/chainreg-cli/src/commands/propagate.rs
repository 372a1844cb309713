use crate::support::{options_or_exit, run_and_report};
use chainreg_registry::Phases;
use std::path::PathBuf;

/// Only asset files are ever rewritten here.
pub fn run(root: PathBuf, check: bool, json_output: bool, files: Vec<PathBuf>) {
    let options = options_or_exit(&root, Phases::Propagate, None, check, files);
    run_and_report("propagate", &options, json_output);
}
