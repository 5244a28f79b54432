use graphrag::{load_requests, replay, ConfigOverrides};
use graphrag_cache::{OptimizerConfig, SharedQueryOptimizer};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_log(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

/// Test: Replaying the same request many times yields one miss
#[tokio::test]
async fn test_replay_identical_requests() {
    let line = r#"{"query": "find entity X", "type": "general"}"#;
    let file = write_log(&[line; 100]);

    let input = load_requests(file.path()).unwrap();
    assert_eq!(input.requests.len(), 100);

    let report = replay(SharedQueryOptimizer::default(), input, 4).await.unwrap();

    assert_eq!(report.processed, 100);
    assert_eq!(report.workers, 4);
    assert_eq!(report.stats.fingerprint_cache.accesses, 100);
    assert_eq!(report.stats.fingerprint_cache.hits, 99);
    assert_eq!(report.stats.type_detection_cache.hits, 99);
    assert_eq!(report.graph_types["general"], 100);
}

/// Test: Mixed log with unusable lines
#[tokio::test]
async fn test_replay_mixed_log() {
    let file = write_log(&[
        r#"{"entity_ids": ["bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"]}"#,
        r#"{"entity_sources": ["wikidata", "ipfs"]}"#,
        "",
        "null",
        r#"{"query": {"malformed": true}}"#,
        "{broken",
        r#"{"type": "wikipedia"}"#,
    ]);

    let input = load_requests(file.path()).unwrap();
    assert_eq!(input.requests.len(), 4);
    assert_eq!(input.skipped.len(), 2);

    let report = replay(SharedQueryOptimizer::default(), input, 3).await.unwrap();

    assert_eq!(report.graph_types["ipld"], 1);
    assert_eq!(report.graph_types["mixed"], 1);
    assert_eq!(report.graph_types["general"], 1);
    assert_eq!(report.graph_types["wikipedia"], 1);
    assert_eq!(report.stats.bypassed, 2);
    assert_eq!(report.skipped[0].line, 4);

    let text = report.to_string();
    assert!(text.contains("skipped line 4"));
    assert!(text.contains("fingerprint_cache:"));
}

/// Test: Capacity flags cap both caches during replay
#[tokio::test]
async fn test_replay_with_capacity_overrides() {
    let lines: Vec<String> = (0..20)
        .map(|i| format!(r#"{{"query": "query {}"}}"#, i))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = write_log(&refs);

    let config = ConfigOverrides {
        max_fingerprint_cache: Some(5),
        max_type_cache: Some(2),
        trust_signatures: false,
    }
    .apply(OptimizerConfig::default())
    .unwrap();

    let optimizer = SharedQueryOptimizer::new(config).unwrap();
    let report = replay(optimizer, load_requests(file.path()).unwrap(), 2)
        .await
        .unwrap();

    assert_eq!(report.stats.fingerprint_cache.size, 5);
    assert_eq!(report.stats.fingerprint_cache.rejected, 15);
    assert_eq!(report.stats.type_detection_cache.size, 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["fingerprint_cache"]["max_size"], 5);
    assert_eq!(json["processed"], 20);
}

/// Test: Missing log file is reported with its path
#[test]
fn test_missing_log_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.jsonl");

    let err = load_requests(&path).unwrap_err();
    assert!(err.to_string().contains("absent.jsonl"));
}
