//! CLI-level integration tests, grounded in the teacher's own subprocess-based integration
//! suite (`examples/MonsieurBarti-code-graph-ai/tests/integration.rs`): every test here invokes
//! the compiled `codegraph-kg` binary rather than linking against crate internals (this crate
//! has no lib target, only a bin).
//!
//! Scope: every command here needs a live Memgraph connection except argument validation, which
//! spec.md §7 requires to fail synchronously before any I/O. These tests exercise exactly that
//! synchronous-validation path — they do not stand up a Memgraph instance, so they cover
//! spec.md §8's "Boundary behaviors" and the ad-hoc/forbidden-operation scenarios, not the
//! round-trip or idempotence scenarios (those are covered by `FakeGraphStore`-backed unit tests
//! inside `src/ingest/mod.rs` and `src/query/*.rs`).

use std::path::PathBuf;
use std::process::Command;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_codegraph-kg"))
}

fn run(args: &[&str]) -> (bool, String, String) {
    let out = Command::new(binary()).args(args).output().expect("failed to invoke codegraph-kg binary");
    (
        out.status.success(),
        String::from_utf8_lossy(&out.stdout).to_string(),
        String::from_utf8_lossy(&out.stderr).to_string(),
    )
}

#[test]
fn rejects_invalid_project_name_on_ingest_without_touching_the_network() {
    let (ok, _stdout, stderr) = run(&["ingest", "--project", "not a valid name"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_invalid_project_name_on_clean() {
    let (ok, _stdout, stderr) = run(&["clean", "not a valid name"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_ad_hoc_mutation_keyword_before_connecting() {
    let (ok, _stdout, stderr) = run(&["ad-hoc", "demo", "MATCH (n) DETACH DELETE n"]);
    assert!(!ok);
    assert!(stderr.contains("FORBIDDEN_OPERATION"));
}

#[test]
fn rejects_ad_hoc_empty_query() {
    let (ok, _stdout, stderr) = run(&["ad-hoc", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_ad_hoc_limit_out_of_range() {
    let (ok, _stdout, stderr) = run(&["ad-hoc", "demo", "MATCH (n) RETURN n", "--limit", "0"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_callers_depth_out_of_range() {
    let (ok, _stdout, stderr) = run(&["callers", "demo", "demo.m.f", "--max-depth", "6"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_callers_empty_qn() {
    let (ok, _stdout, stderr) = run(&["callers", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_unknown_hierarchy_direction() {
    let (ok, _stdout, stderr) = run(&["hierarchy", "demo", "demo.m.Class", "--direction", "sideways"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_unknown_dependencies_kind() {
    let (ok, _stdout, stderr) = run(&["dependencies", "demo", "demo.m.f", "--kind", "exports"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_call_graph_max_nodes_out_of_range() {
    let (ok, _stdout, stderr) = run(&["call-graph", "demo", "demo.m.f", "--max-nodes", "0"]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_hierarchy_empty_qn() {
    let (ok, _stdout, stderr) = run(&["hierarchy", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_dependencies_empty_qn() {
    let (ok, _stdout, stderr) = run(&["dependencies", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_implementations_empty_qn() {
    let (ok, _stdout, stderr) = run(&["implementations", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn rejects_module_exports_empty_qn() {
    let (ok, _stdout, stderr) = run(&["module-exports", "demo", ""]);
    assert!(!ok);
    assert!(stderr.contains("INVALID_ARGUMENTS"));
}

#[test]
fn reports_errors_as_an_envelope_with_a_request_id() {
    let (ok, _stdout, stderr) = run(&["clean", "bad name"]);
    assert!(!ok);
    assert!(stderr.contains("\"request_id\""));
    assert!(stderr.contains("\"success\": false"));
}
