//! CLI command integration tests.
//!
//! These tests run the `pagezip` binary against temporary files.

#![cfg(feature = "cli")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

mod common;

fn pagezip(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pagezip"))
        .args(args)
        .output()
        .expect("Failed to run pagezip")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

/// Writes the sample page as JSON and packs it.
fn pack_sample(dir: &TempDir) -> std::path::PathBuf {
    let page_path = dir.path().join("page.json");
    let archive_path = dir.path().join("sample.html");
    std::fs::write(&page_path, serde_json::to_vec(&common::sample_page()).unwrap()).unwrap();

    let output = pagezip(&[
        "pack",
        path_arg(&page_path),
        "-o",
        path_arg(&archive_path),
        "--insert-text-body",
        "--url",
        "https://example.com/override",
    ]);
    assert!(output.status.success(), "pack failed: {output:?}");
    archive_path
}

#[test]
fn test_pack_writes_page_archive() {
    let dir = TempDir::new().unwrap();
    let archive_path = pack_sample(&dir);

    let bytes = std::fs::read(&archive_path).unwrap();
    assert!(pagezip::shell::is_page_archive(&bytes));
    let archive = pagezip::Archive::open(bytes).unwrap();
    assert_eq!(
        archive.entry("index.html").unwrap().comment(),
        Some("https://example.com/override")
    );
}

#[test]
fn test_list_json() {
    let dir = TempDir::new().unwrap();
    let archive_path = pack_sample(&dir);

    let output = pagezip(&["list", path_arg(&archive_path), "--format", "json"]);
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let paths: Vec<_> = listing["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        paths,
        ["index.html", "stylesheet_0.css", "scripts/0.js", "images/0.png", "fonts/0.woff2"]
    );
    assert_eq!(listing["trailer_size"], pagezip::TRAILER.len());
}

#[test]
fn test_extract_and_open() {
    let dir = TempDir::new().unwrap();
    let archive_path = pack_sample(&dir);

    let out_dir = dir.path().join("raw");
    let output = pagezip(&["extract", path_arg(&archive_path), "-o", path_arg(&out_dir), "-q"]);
    assert!(output.status.success());
    assert_eq!(
        std::fs::read(out_dir.join("images/0.png")).unwrap(),
        common::PNG_BYTES
    );

    let rebuilt = dir.path().join("rebuilt.html");
    let output = pagezip(&["open", path_arg(&archive_path), "-o", path_arg(&rebuilt), "-q"]);
    assert!(output.status.success());
    let html = std::fs::read_to_string(&rebuilt).unwrap();
    assert!(html.contains("Sample page"));
    assert!(!html.contains("blob:pagezip/"));
}

#[test]
fn test_exit_codes() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("bogus.html");
    std::fs::write(&bogus, "<html>not an archive</html>").unwrap();

    let output = pagezip(&["list", path_arg(&bogus)]);
    assert_eq!(output.status.code(), Some(3));

    let missing = dir.path().join("missing.html");
    let output = pagezip(&["list", path_arg(&missing)]);
    assert_eq!(output.status.code(), Some(5));

    let page_path = dir.path().join("page.json");
    std::fs::write(&page_path, "{\"content\": \"<p>x</p>\"}").unwrap();
    let output = pagezip(&[
        "pack",
        path_arg(&page_path),
        "-o",
        path_arg(&dir.path().join("out.html")),
        "--level",
        "12",
    ]);
    assert_eq!(output.status.code(), Some(255));
}
