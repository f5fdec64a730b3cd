//! Runs the `strata` binary against fixtures written to a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

fn strata(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .env("STRATA_LOG_FILTER", "off")
        .output()
        .unwrap()
}

fn data_uri(bytes: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes))
}

/// Two quads side by side as four indexed triangles.
fn quad_strip(dir: &Path) -> PathBuf {
    let positions: [f32; 18] = [
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 2.0, 0.0, 1.0,
    ];
    let indices: [u16; 12] = [0, 1, 4, 0, 4, 3, 1, 2, 5, 1, 5, 4];
    let mut bytes: Vec<u8> = positions.iter().flat_map(|v| v.to_le_bytes()).collect();
    bytes.extend(indices.iter().flat_map(|i| i.to_le_bytes()));

    let document = json!({
        "asset": { "version": "2.0", "generator": "cli fixture" },
        "buffers": [{ "byteLength": bytes.len(), "uri": data_uri(&bytes) }],
        "bufferViews": [
            { "buffer": 0, "byteLength": 72 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 6, "type": "VEC3" },
            { "bufferView": 1, "componentType": 5123, "count": 12, "type": "SCALAR" }
        ],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
        "nodes": [{ "mesh": 0 }],
        "scenes": [{ "nodes": [0] }]
    });
    let path = dir.join("strip.gltf");
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();
    path
}

#[test]
fn test_inspect_json_summary() {
    let dir = TempDir::new().unwrap();
    let path = quad_strip(dir.path());
    let output = strata(&["inspect", "--json", path.to_str().unwrap()]);
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["generator"], "cli fixture");
    assert_eq!(report["asset"]["name"], "strip");
    assert_eq!(report["asset"]["primitives"], 1);
}

#[test]
fn test_inspect_failure_exit_code() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.gltf");
    fs::write(&path, br#"{ "asset": { "version": "1.0" } }"#).unwrap();

    let output = strata(&["inspect", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("import failed"));
    assert!(text.contains("[error] This importer supports glTF asset version 2.0 or later."));
}

#[test]
fn test_select_triangles_to_vertices() {
    let dir = TempDir::new().unwrap();
    let path = quad_strip(dir.path());
    let output = strata(&["select", path.to_str().unwrap(), "--indices", "0", "--to", "vertex"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["element"], "Vertex");
    assert_eq!(result["vertices"], json!([0, 1, 4]));
}

#[test]
fn test_select_missing_primitive() {
    let dir = TempDir::new().unwrap();
    let path = quad_strip(dir.path());
    let output = strata(&["select", path.to_str().unwrap(), "--mesh", "3", "--indices", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Mesh 3 has no primitive 0"));
}

#[test]
fn test_select_polygroup_faces_with_expansion() {
    let dir = TempDir::new().unwrap();
    let path = quad_strip(dir.path());
    let output = strata(&[
        "select",
        path.to_str().unwrap(),
        "--indices",
        "0",
        "--topology",
        "polygroup",
        "--group-size",
        "2",
        "--expand",
        "1",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["topology"], "Polygroup");
    assert_eq!(result["polygroups"], json!([0, 1]));
    assert_eq!(result["triangles"], json!([0, 1, 2, 3]));
}
