use docgraph::config::*;
use docgraph::errors::DocGraphError;
use tempfile::TempDir;

#[test]
fn test_default_config_values() {
    let config = DocGraphConfig::default();
    assert_eq!(config.version, 1);
    assert_eq!(config.matcher.context_window, 50);
    assert_eq!(config.builder.max_section_children, 5);
    assert_eq!(config.builder.follows_weight, 0.8);
    assert_eq!(config.builder.hierarchy_weight, 0.9);
    assert_eq!(config.resolution.min_edge_confidence, 0.5);
    assert_eq!(config.validation.min_precision, 0.6);
    assert_eq!(config.validation.min_recall, 0.7);
    assert_eq!(config.validation.max_density, 2.0);
    assert_eq!(config.accuracy.min_score, 0.7);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(&dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, DocGraphConfig::default());
}

#[test]
fn test_save_and_load_json_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docgraph.json");
    let mut config = DocGraphConfig::default();
    config.matcher.context_window = 25;
    config.resolution.min_edge_confidence = 0.65;

    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_toml_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("docgraph.toml");
    let mut config = DocGraphConfig::default();
    config.builder.max_heading_length = 80;
    config.validation.slow_build_ms = 250;

    save_config(&path, &config).unwrap();
    assert!(path.exists());
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[matcher]\ncontext_window = 10\n").unwrap();

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.matcher.context_window, 10);
    assert_eq!(loaded.matcher.max_text_bytes, 1_000_000);
    assert_eq!(loaded.builder, BuilderConfig::default());
}

#[test]
fn test_malformed_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    match load_config(&path) {
        Err(DocGraphError::Config { message }) => assert!(message.contains("broken.json")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docgraph.json");
    save_config(&path, &DocGraphConfig::default()).unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["docgraph.json".to_string()]);
}
