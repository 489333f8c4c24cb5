use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_communities_from_artifacts() {
    let dir = tempfile::tempdir().unwrap();

    // 6-ring with uniform weights splits into three adjacent pairs.
    let edge_index = write(
        dir.path(),
        "edge_index.txt",
        "0,1\n1,0\n1,2\n2,1\n2,3\n3,2\n3,4\n4,3\n4,5\n5,4\n5,0\n0,5\n",
    );
    let edge_masks = write(
        dir.path(),
        "edge_masks.txt",
        &"0.50000\n".repeat(12),
    );

    Command::cargo_bin("subnetx")
        .unwrap()
        .args(["communities", "--edge-index"])
        .arg(&edge_index)
        .arg("--edge-masks")
        .arg(&edge_masks)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected 3 communities"))
        .stdout(predicate::str::contains("[0, 1]"))
        .stdout(predicate::str::contains("[2, 3]"))
        .stdout(predicate::str::contains("[4, 5]"));
}

#[test]
fn test_communities_writes_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results");

    let edge_index = write(dir.path(), "edge_index.txt", "0,1\n1,0\n");
    let edge_masks = write(dir.path(), "edge_masks.txt", "0.80000\n0.80000\n");

    Command::cargo_bin("subnetx")
        .unwrap()
        .args(["communities", "--edge-index"])
        .arg(&edge_index)
        .arg("--edge-masks")
        .arg(&edge_masks)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("communities.txt").exists());
    assert!(out.join("communities_scores.txt").exists());
}

#[test]
fn test_communities_missing_file_fails() {
    Command::cargo_bin("subnetx")
        .unwrap()
        .args([
            "communities",
            "--edge-index",
            "/nonexistent/edge_index.txt",
            "--edge-masks",
            "/nonexistent/edge_masks.txt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Community detection failed"));
}

#[test]
fn test_stats_reports_dataset_shape() {
    let dir = tempfile::tempdir().unwrap();

    let ppi = write(dir.path(), "ppi.txt", "G1 G2 990\nG2 G3 980\n");
    let feat = write(
        dir.path(),
        "mrna.txt",
        "G1 G2 G3\n0.1 0.2 0.3\n0.9 0.8 0.7\n",
    );
    let targets = write(dir.path(), "target.txt", "0\n1\n");

    Command::cargo_bin("subnetx")
        .unwrap()
        .args(["stats", "--ppi"])
        .arg(&ppi)
        .arg("--features")
        .arg(&feat)
        .arg("--targets")
        .arg(&targets)
        .assert()
        .success()
        .stdout(predicate::str::contains("Samples:    2"))
        .stdout(predicate::str::contains("Genes:      3"))
        .stdout(predicate::str::contains("Modalities: 1"));
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("subnetx")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("explain"))
        .stdout(predicate::str::contains("communities"));
}
