use chainreg_kernel::Finding;
use chainreg_registry::{FileChange, Phases, RunOptions, RunReport, run};
use std::path::{Path, PathBuf};

/// Options for one invocation. Configuration errors exit with status 2.
pub fn options_or_exit(
    root: &Path,
    phases: Phases,
    ignore_file: Option<PathBuf>,
    check: bool,
    files: Vec<PathBuf>,
) -> RunOptions {
    let mut options = RunOptions::configured(root, phases, ignore_file.as_deref())
        .unwrap_or_else(|error| {
            eprintln!("error: {error}");
            std::process::exit(2);
        });
    options.check_only = check;
    if !files.is_empty() {
        options.files = Some(files);
    }
    options
}

/// Run the pipeline, print the report, and exit non-zero unless accepted.
pub fn run_and_report(tag: &str, options: &RunOptions, json_output: bool) {
    tracing::debug!(
        command = tag,
        root = %options.root.display(),
        check = options.check_only,
        ignore_entries = options.ignore.len(),
        "starting pipeline"
    );
    let report = run(options).unwrap_or_else(|error| {
        eprintln!("error: {error}");
        std::process::exit(1);
    });

    if json_output {
        let rendered = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            eprintln!("error: failed to render {tag} report: {error}");
            std::process::exit(2);
        });
        println!("{rendered}");
    } else {
        print_report(tag, &report);
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}

fn print_report(tag: &str, report: &RunReport) {
    println!(
        "[{tag}] {} (chains={}, files={}, propagated={}, rewritten={}, stale={}, findings={}, ignored={})",
        if report.accepted() { "OK" } else { "FAIL" },
        report.chain_count,
        report.file_count,
        report.propagated,
        report.rewritten.len(),
        report.stale.len(),
        report.findings.len(),
        report.ignored.len(),
    );
    for skipped in &report.skipped_origins {
        println!(
            "  - SKIP {}/asset {} (origin chain {} not tracked)",
            skipped.chain, skipped.asset_id, skipped.origin_chain
        );
    }
    print_changes("rewrote", &report.rewritten);
    print_changes("stale", &report.stale);
    print_findings("", &report.findings);
    print_findings("IGNORED ", &report.ignored);
}

fn print_changes(label: &str, changes: &[FileChange]) {
    for change in changes {
        println!("  - {label} {}", change.path.display());
    }
}

fn print_findings(prefix: &str, findings: &[Finding]) {
    for finding in findings {
        println!("  - {prefix}{} ({})", finding.message, finding.rule);
    }
}
