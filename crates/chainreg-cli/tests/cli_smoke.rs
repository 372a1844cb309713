use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "chainreg-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("chain dir should be created");
        }
        fs::write(path, contents).expect("fixture should write");
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const MISSING_ENTITY: &str =
    r#"osmosis/entity: name "Acme" is referenced by contract but not defined"#;

fn seed_registry(dir: &TempDirGuard) {
    dir.write(
        "cosmoshub/asset.json",
        r#"[{"id": "uatom", "name": "Cosmos", "symbol": "ATOM", "decimals": "6", "type": "native"}]"#,
    );
    dir.write(
        "osmosis/asset.json",
        r#"[
          {"id": "uosmo", "name": "Osmosis", "symbol": "OSMO", "decimals": "6", "type": "native"},
          {"id": "ibc/XYZ", "name": "ibc/XYZ", "symbol": "ibc/XYZ", "decimals": "6",
           "type": "ibc", "origin_chain": "cosmoshub", "origin_id": "uatom"}
        ]"#,
    );
    dir.write(
        "osmosis/contract.json",
        r#"[{"id": "osmo1pool", "entity": "Acme", "label": "Router"}]"#,
    );
}

fn run_chainreg<I, S>(root: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_chainreg");
    Command::new(bin)
        .arg("--root")
        .arg(root)
        .args(["--log-level", "warn"])
        .args(args)
        .env_remove("ROOT_DIR")
        .output()
        .expect("chainreg command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON ({e})\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    })
}

fn messages(payload: &Value, field: &str) -> Vec<String> {
    payload[field]
        .as_array()
        .expect("finding list")
        .iter()
        .map(|finding| {
            finding["message"]
                .as_str()
                .expect("finding message")
                .to_string()
        })
        .collect()
}

#[test]
fn run_json_reports_rejection_and_propagates() {
    let dir = TempDirGuard::new("run-json");
    seed_registry(&dir);

    let output = run_chainreg(dir.path(), ["run", "--json"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "chainreg.run.v1");
    assert_eq!(payload["result"], "rejected");
    assert_eq!(payload["chainCount"], 2);
    assert_eq!(payload["fileCount"], 3);
    assert_eq!(payload["propagated"], 1);
    assert_eq!(messages(&payload, "findings"), vec![MISSING_ENTITY]);

    let rewritten = payload["rewritten"].as_array().expect("rewritten list");
    assert!(!rewritten.is_empty());
    for change in rewritten {
        assert_eq!(change["digest"].as_str().map(str::len), Some(64));
    }

    let osmosis =
        fs::read_to_string(dir.path().join("osmosis/asset.json")).expect("asset file readable");
    assert!(osmosis.contains("\"symbol\": \"ATOM\""));
}

#[test]
fn run_with_ignore_file_is_accepted() {
    let dir = TempDirGuard::new("run-ignore");
    seed_registry(&dir);
    let ignore = dir.path().join("known.txt");
    fs::write(&ignore, format!("{MISSING_ENTITY}\n")).expect("ignore file should write");

    let output = run_chainreg(
        dir.path(),
        [OsStr::new("run"), OsStr::new("--ignore-file"), ignore.as_os_str()],
    );
    assert_success(&output);
    let stdout = stdout_text(&output);
    assert!(stdout.contains("[run] OK"));
    assert!(stdout.contains("IGNORED"));
}

#[test]
fn missing_explicit_ignore_file_exits_with_config_status() {
    let dir = TempDirGuard::new("ignore-missing");
    seed_registry(&dir);

    let output = run_chainreg(dir.path(), ["validate", "--ignore-file", "/nonexistent/ignore.txt"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn sort_check_fails_then_passes_after_sort() {
    let dir = TempDirGuard::new("sort-check");
    seed_registry(&dir);
    let before =
        fs::read_to_string(dir.path().join("osmosis/asset.json")).expect("asset file readable");

    let check = run_chainreg(dir.path(), ["sort", "--check", "--json"]);
    assert_failure(&check);
    let payload = parse_json_stdout(&check);
    assert_eq!(payload["result"], "rejected");
    assert!(!payload["stale"].as_array().expect("stale list").is_empty());
    let after_check =
        fs::read_to_string(dir.path().join("osmosis/asset.json")).expect("asset file readable");
    assert_eq!(after_check, before);

    assert_success(&run_chainreg(dir.path(), ["sort"]));

    let recheck = run_chainreg(dir.path(), ["sort", "--check"]);
    assert_success(&recheck);
    assert!(stdout_text(&recheck).contains("[sort] OK"));
}

#[test]
fn validate_reports_findings_without_writing() {
    let dir = TempDirGuard::new("validate");
    seed_registry(&dir);
    let before =
        fs::read_to_string(dir.path().join("osmosis/asset.json")).expect("asset file readable");

    let output = run_chainreg(dir.path(), ["validate"]);
    assert_failure(&output);
    let stdout = stdout_text(&output);
    assert!(stdout.contains("[validate] FAIL"));
    // Before propagation the bridged asset still uses its id as name.
    assert!(stdout.contains(r#"osmosis/asset: id "ibc/XYZ" is used as name"#));
    assert!(stdout.contains(MISSING_ENTITY));

    let after =
        fs::read_to_string(dir.path().join("osmosis/asset.json")).expect("asset file readable");
    assert_eq!(after, before);
}

#[test]
fn missing_origin_is_a_fatal_error() {
    let dir = TempDirGuard::new("missing-origin");
    seed_registry(&dir);
    dir.write(
        "osmosis/asset.json",
        r#"[{"id": "ibc/ABC", "name": "x", "symbol": "x", "decimals": "6", "type": "ibc",
            "origin_chain": "cosmoshub", "origin_id": "uunknown"}]"#,
    );

    let output = run_chainreg(dir.path(), ["propagate"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("uunknown"));
}

#[test]
fn root_falls_back_to_root_dir_env() {
    let dir = TempDirGuard::new("env-root");
    dir.write(
        "osmosis/entity.json",
        r#"[{"name": "Acme"}]"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_chainreg"))
        .args(["--log-level", "error", "validate", "--json"])
        .env("ROOT_DIR", dir.path())
        .output()
        .expect("chainreg command should execute");
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["chainCount"], 1);
}
