use crate::support::{options_or_exit, run_and_report};
use chainreg_registry::Phases;
use std::path::PathBuf;

pub fn run(root: PathBuf, ignore_file: Option<PathBuf>, json_output: bool, files: Vec<PathBuf>) {
    let options = options_or_exit(&root, Phases::Validate, ignore_file, false, files);
    run_and_report("validate", &options, json_output);
}
