//! Loading optimization configs from disk.

use std::path::Path;
use stratopt_runner::{ConfigError, MethodConfig, Objective, OptimizationConfig};

const WALK_FORWARD_TOML: &str = r#"
objective = "net_profit"
seed = 2024
parallel = false

[method]
type = "walk_forward"
periods = 4

[method.inner]
type = "monte_carlo"
iterations = 25

[date_range]
start = "2022-01-01T00:00:00Z"
end = "2024-01-01T00:00:00Z"

[[parameters]]
name = "period"
min = 10
max = 50
step = 10

[[parameters]]
name = "threshold"
values = [0.25, 0.5, 0.75]
"#;

#[test]
fn loads_nested_walk_forward_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wf.toml");
    std::fs::write(&path, WALK_FORWARD_TOML).unwrap();

    let config = OptimizationConfig::load(&path).unwrap();
    assert_eq!(config.objective, Objective::NetProfit);
    assert_eq!(config.seed, 2024);
    assert!(!config.parallel);
    assert_eq!(
        config.method,
        MethodConfig::WalkForward {
            periods: 4,
            inner: Box::new(MethodConfig::MonteCarlo { iterations: 25 }),
        }
    );
    assert_eq!(config.parameters.grid_size(), Some(15));
    assert_eq!(config.planned_evaluations(), Some(100));
}

#[test]
fn json_and_toml_describe_the_same_config() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("wf.toml");
    std::fs::write(&toml_path, WALK_FORWARD_TOML).unwrap();
    let from_toml = OptimizationConfig::load(&toml_path).unwrap();

    let json_path = dir.path().join("wf.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&from_toml).unwrap()).unwrap();
    let from_json = OptimizationConfig::load(&json_path).unwrap();

    assert_eq!(from_toml, from_json);
}

#[test]
fn invalid_file_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    let bad = WALK_FORWARD_TOML.replace("periods = 4", "periods = 0");
    std::fs::write(&path, bad).unwrap();
    assert!(matches!(
        OptimizationConfig::load(&path),
        Err(ConfigError::ZeroPeriods)
    ));
}

#[test]
fn syntax_errors_surface_as_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("broken.toml");
    std::fs::write(&toml_path, "[method\ntype = ").unwrap();
    assert!(matches!(
        OptimizationConfig::load(&toml_path),
        Err(ConfigError::Toml(_))
    ));

    let json_path = dir.path().join("broken.json");
    std::fs::write(&json_path, "{\"method\": ").unwrap();
    assert!(matches!(
        OptimizationConfig::load(&json_path),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let err = OptimizationConfig::load(Path::new("/nonexistent/stratopt/config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("config.toml"));
}
