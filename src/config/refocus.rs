use crate::restore::RefocusParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `refocus_demo` tool.
#[derive(Debug, Deserialize)]
pub struct RefocusToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(default)]
    pub params: RefocusParams,
    pub output: RefocusOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct RefocusOutputConfig {
    pub image: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<RefocusToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn parse_config(data: &str) -> Result<RefocusToolConfig, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;

    #[test]
    fn minimal_config_uses_default_params() {
        let cfg = parse_config(r#"{"input": "in.png", "output": {"image": "out.png"}}"#).unwrap();
        assert_eq!(cfg.input, PathBuf::from("in.png"));
        assert_eq!(cfg.params, RefocusParams::default());
        assert!(cfg.output.report_json.is_none());
    }

    #[test]
    fn params_and_report_path_are_read() {
        let cfg = parse_config(
            r#"{
                "input": "in.png",
                "params": {"radius": 3, "iterations": 20, "boundary": "periodic"},
                "output": {"image": "out.png", "report_json": "out/report.json"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.params.radius, 3.0);
        assert_eq!(cfg.params.iterations, 20);
        assert_eq!(cfg.params.boundary, Boundary::Periodic);
        assert_eq!(cfg.output.report_json, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/refocus.json")).unwrap_err();
        assert!(err.starts_with("Failed to read config /nonexistent/refocus.json"));
    }
}
