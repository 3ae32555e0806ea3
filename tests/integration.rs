use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn forge_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("forge");
    path
}

const TOPICS: &str = r#"[
  {"name":"Yoga Basics","confidence":92,"keywords":["yoga","stretch","breath"],
   "pages":[1,2],"contentType":"educational","sentiment":"positive"},
  {"name":"Yoga Safety","confidence":81,"keywords":["yoga","injury","breath"],
   "pages":[3],"contentType":"educational","sentiment":"neutral"},
  {"name":"Quarterly Revenue","confidence":77,"keywords":["revenue","margin"],
   "pages":[7,8,9],"contentType":"financial","sentiment":"negative"}
]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    fs::write(root.join("topics.json"), TOPICS).unwrap();

    // Generation disabled: every group is skipped without network access.
    let config_content = format!(
        r#"[db]
path = "{root}/data/forge.sqlite"

[generation]
provider = "disabled"
pacing_ms = 0

[storage]
backend = "filesystem"
root = "{root}/data/blobs"
public_base_url = "http://127.0.0.1:7341/files"

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("forge.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_forge(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = forge_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run forge binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn create_job(config_path: &Path, name: &str) -> String {
    let (stdout, stderr, success) =
        run_forge(config_path, &["job", "create", name, "--size", "2048"]);
    assert!(success, "job create failed: {}", stderr);
    stdout.trim().to_string()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_forge(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/forge.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_forge(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_forge(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_job_create_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_forge(&config_path, &["init"]);

    let id = create_job(&config_path, "handbook.pdf");
    assert_eq!(id.len(), 36, "expected a UUID, got: {}", id);

    let (stdout, _, success) = run_forge(&config_path, &["jobs", "list"]);
    assert!(success);
    assert!(stdout.contains(&id));
    assert!(stdout.contains("handbook.pdf"));
    assert!(stdout.contains("processing"));
}

#[test]
fn test_jobs_list_empty() {
    let (_tmp, config_path) = setup_test_env();
    run_forge(&config_path, &["init"]);

    let (stdout, _, success) = run_forge(&config_path, &["jobs", "list"]);
    assert!(success);
    assert!(stdout.contains("No jobs."));
}

#[test]
fn test_group_preview_needs_no_config() {
    let (tmp, _config_path) = setup_test_env();
    let topics = tmp.path().join("topics.json");

    let output = Command::new(forge_binary())
        .arg("--config")
        .arg(tmp.path().join("missing.toml"))
        .arg("group")
        .arg(&topics)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("3 topics -> 2 groups"), "got: {}", stdout);
    assert!(stdout.contains("Yoga Basics [educational, positive, 3 pages]"));
    assert!(stdout.contains("  + Yoga Safety"));
    assert!(stdout.contains("Quarterly Revenue [financial, negative, 3 pages]"));
}

#[test]
fn test_process_with_generation_disabled_completes_empty() {
    let (tmp, config_path) = setup_test_env();
    run_forge(&config_path, &["init"]);
    let id = create_job(&config_path, "handbook.pdf");

    let topics = tmp.path().join("topics.json");
    let (stdout, stderr, success) = run_forge(
        &config_path,
        &["process", topics.to_str().unwrap(), "--job", &id],
    );
    assert!(success, "process failed: {}", stderr);

    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["jobId"], id.as_str());
    assert_eq!(response["processedTopics"], 0);
    assert!(response["results"].as_array().unwrap().is_empty());

    let skipped = response["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|s| s["stage"] == "generation"));

    let (show, _, success) = run_forge(&config_path, &["jobs", "show", &id]);
    assert!(success);
    assert!(show.contains("Status:      completed"));
    assert!(show.contains("Autonomous:  true"));
    assert!(show.contains("Content:     0"));
    assert!(show.contains("Topics (3):"));
    assert!(show.contains("No generated content."));
}

#[test]
fn test_process_unknown_job_fails() {
    let (tmp, config_path) = setup_test_env();
    run_forge(&config_path, &["init"]);

    let topics = tmp.path().join("topics.json");
    let (_, stderr, success) = run_forge(
        &config_path,
        &["process", topics.to_str().unwrap(), "--job", "no-such-job"],
    );
    assert!(!success);
    assert!(stderr.contains("job not found"));
}

#[test]
fn test_jobs_delete() {
    let (_tmp, config_path) = setup_test_env();
    run_forge(&config_path, &["init"]);
    let id = create_job(&config_path, "old.pdf");

    let (stdout, _, success) = run_forge(&config_path, &["jobs", "delete", &id]);
    assert!(success);
    assert!(stdout.contains("Deleted job"));

    let (_, _, success) = run_forge(&config_path, &["jobs", "show", &id]);
    assert!(!success);

    let (_, stderr, success) = run_forge(&config_path, &["jobs", "delete", &id]);
    assert!(!success);
    assert!(stderr.contains("job not found"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("config/bad.toml");
    fs::write(
        &bad,
        "[db]\npath = \"x.sqlite\"\n[generation]\nprovider = \"llama\"\n",
    )
    .unwrap();

    let (_, stderr, success) = run_forge(&bad, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Unknown generation provider"));
}
