//! Integration tests for the `classbuddy` binary.
//!
//! Every test runs the real binary with config and data directories pointed
//! at a fresh temporary directory, so nothing touches the user's files and no
//! network access is needed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use classbuddy_test_utils::sample_plan;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_plan(&self) -> PathBuf {
        let path = self.path().join("plan.json");
        std::fs::write(&path, serde_json::to_string_pretty(&sample_plan()).unwrap()).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_classbuddy"))
            .args(args)
            .current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("CLASSBUDDY_DATA_DIR", self.path().join("data"))
            .env("RUST_LOG", "warn")
            .env_remove("CLASSBUDDY_LLM_API_KEY")
            .env_remove("CLASSBUDDY_LLM_URL")
            .env_remove("GAMMA_API_KEY")
            .env_remove("CLASSBUDDY_GAMMA_URL")
            .output()
            .expect("failed to run classbuddy")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn history_save_list_show_clear() {
    let sandbox = Sandbox::new();
    let plan = sandbox.write_plan();

    let out = sandbox.run(&["history", "save", plan.to_str().unwrap()]);
    assert!(out.status.success(), "save failed: {}", stderr(&out));
    let text = stdout(&out);
    let id = text.trim().rsplit(' ').next().unwrap().to_string();
    assert!(text.starts_with("Saved \"Ciências\""));

    let out = sandbox.run(&["history", "list"]);
    assert!(out.status.success());
    let listing = stdout(&out);
    assert!(listing.contains(&id));
    assert!(listing.contains("1 of 20 slots used."));

    let out = sandbox.run(&["history", "show", &id]);
    assert!(out.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(shown["lessonPlan"]["subject"], "Ciências");

    // The history file lives under the data directory.
    assert!(sandbox.path().join("data").read_dir().unwrap().next().is_some());

    let out = sandbox.run(&["history", "clear"]);
    assert!(out.status.success());
    let out = sandbox.run(&["history", "list"]);
    assert_eq!(stdout(&out), "No saved lessons.\n");
}

#[test]
fn export_all_formats_to_directory() {
    let sandbox = Sandbox::new();
    let plan = sandbox.write_plan();
    let out_dir = sandbox.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let out = sandbox.run(&[
        "export",
        plan.to_str().unwrap(),
        "--format",
        "all",
        "--output",
        out_dir.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "export failed: {}", stderr(&out));

    let mut extensions: Vec<String> = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            path.extension().unwrap().to_string_lossy().to_string()
        })
        .collect();
    extensions.sort();
    assert_eq!(extensions, ["pdf", "pptx", "txt"]);
}

#[test]
fn export_from_history_defaults_to_working_directory() {
    let sandbox = Sandbox::new();
    let plan = sandbox.write_plan();
    let out = sandbox.run(&["history", "save", plan.to_str().unwrap()]);
    let id = stdout(&out).trim().rsplit(' ').next().unwrap().to_string();

    let out = sandbox.run(&["export", "--from-history", &id, "--format", "txt"]);
    assert!(out.status.success(), "export failed: {}", stderr(&out));

    let written: Vec<PathBuf> = std::fs::read_dir(sandbox.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("plano_Ciências_"), "unexpected name: {name}");
}

#[test]
fn unknown_export_format_fails() {
    let sandbox = Sandbox::new();
    let plan = sandbox.write_plan();
    let out = sandbox.run(&["export", plan.to_str().unwrap(), "--format", "docx"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("docx"));
}

#[test]
fn generate_without_api_key_fails_cleanly() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["generate", "Frações", "--subject", "Matemática"]);
    assert!(!out.status.success());
    assert!(
        stderr(&out).contains("Chave da API de IA"),
        "unexpected stderr: {}",
        stderr(&out)
    );
    assert!(stdout(&out).is_empty());
}

#[test]
fn generate_rejects_out_of_range_time() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["generate", "Frações", "--time", "5"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("10"), "unexpected stderr: {}", stderr(&out));
}

#[test]
fn init_writes_config_once() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["init", "--gamma-api-key", "gamma-secret-key-123"]);
    assert!(out.status.success(), "init failed: {}", stderr(&out));
    assert!(stdout(&out).contains("gamm...-123"));

    let path = sandbox.path().join("config").join("classbuddy").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[gamma]"));
    assert!(contents.contains("gamma-secret-key-123"));

    let again = sandbox.run(&["init"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    let forced = sandbox.run(&["init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn completions_are_generated() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["completions", "bash"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("classbuddy"));
}
