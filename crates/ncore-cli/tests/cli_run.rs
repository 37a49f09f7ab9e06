//! End-to-end tests of the ncore binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WTA_RUN: &str = r#"
[run]
ticks = 20

[population]
neurons = 8

[synapses]
delay_bits = 4
max_row_length = 8

[[channel]]
name = "inhibitory"
tau_ms = 5.0

[[projection]]
connector = { type = "wta", n_values = 4 }
weight = { type = "constant", value = 1.0 }
delay = { type = "constant", value = 1.0 }

[[stimulus]]
pre = 0
period = 5
"#;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("run.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn ncore() -> Command {
    Command::cargo_bin("ncore").unwrap()
}

#[test]
fn run_reports_provenance_as_json() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, WTA_RUN);

    let output = ncore()
        .args(["run", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ticks_run"], 20);
    assert_eq!(report["synapses"], 24);
    assert_eq!(report["provenance"]["spikes"]["n_received"], 4);
    assert_eq!(report["provenance"]["spikes"]["n_pre_synaptic_events"], 4);
    assert_eq!(report["provenance"]["spikes"]["n_synapses_delivered"], 12);
    assert_eq!(report["provenance"]["neuron"]["n_timestep_updates"], 20);
    assert_eq!(report["provenance"]["n_background_queue_overloads"], 0);
    assert_eq!(report["provenance_words"].as_array().unwrap().len(), 15);
}

#[test]
fn run_resumes_for_extra_ticks() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, WTA_RUN);
    let report_path = dir.path().join("report.json");

    ncore()
        .args(["run", "--resume-ticks", "10", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["ticks_run"], 30);
    assert_eq!(report["provenance"]["neuron"]["n_pauses"], 2);
    assert_eq!(report["provenance"]["neuron"]["n_resumes"], 1);
    assert_eq!(report["provenance"]["synapse"]["n_resumes"], 1);
}

#[test]
fn expand_prints_rows() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, WTA_RUN);

    let output = ncore()
        .args(["expand", "--rows", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["blocks"], 1);
    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 8);
    let targets: Vec<u64> = rows[0]["synapses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["index"].as_u64().unwrap())
        .collect();
    assert_eq!(targets, vec![1, 2, 3]);
}

#[test]
fn undersized_matrix_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &WTA_RUN.replace("max_row_length = 8", "max_row_length = 2"));

    ncore()
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Command failed"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &WTA_RUN.replace("neurons = 8", "neurons = 0"));

    ncore()
        .args(["expand", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("population.neurons"));
}

#[test]
fn missing_config_is_reported() {
    ncore()
        .args(["run", "--config", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
