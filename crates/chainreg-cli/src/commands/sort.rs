use crate::support::{options_or_exit, run_and_report};
use chainreg_registry::Phases;
use std::path::PathBuf;

pub fn run(root: PathBuf, check: bool, json_output: bool, files: Vec<PathBuf>) {
    let options = options_or_exit(&root, Phases::Sort, None, check, files);
    run_and_report("sort", &options, json_output);
}
