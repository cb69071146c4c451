use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::validate::Rules;

/// Looked up in the working directory; any supported extension works.
const DEFAULT_CONFIG: &str = "exam_guide";
const ENV_PREFIX: &str = "EXAM_GUIDE";

/// Layered settings: defaults, then the config file, then `EXAM_GUIDE_*`
/// environment variables. CLI flags are applied on top by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub out_dir: PathBuf,
    pub expected_exam_code: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            expected_exam_code: None,
        }
    }
}

impl Settings {
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::layered(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn layered(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn rules(&self) -> Rules {
        Rules {
            expected_exam_code: self.expected_exam_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.out_dir, PathBuf::from("."));
        assert!(s.rules().expected_exam_code.is_none());
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        std::fs::write(&path, "out_dir = \"build/ai102\"\nexpected_exam_code = \"AI-102\"\n").unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.out_dir, PathBuf::from("build/ai102"));
        assert_eq!(s.rules().expected_exam_code.as_deref(), Some("AI-102"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        std::fs::write(&path, "expected_exam_code = \"AI-900\"\n").unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.out_dir, PathBuf::from("."));
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let mut map = config::Map::new();
        for (k, v) in vars {
            map.insert(k.to_string(), v.to_string());
        }
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.toml");
        std::fs::write(&path, "out_dir = \"build/ai102\"\nexpected_exam_code = \"AI-102\"\n").unwrap();

        let vars = env(&[("EXAM_GUIDE_OUT_DIR", "dist")]);
        let s = Settings::layered(Some(&path), vars).unwrap();
        assert_eq!(s.out_dir, PathBuf::from("dist"));
        assert_eq!(s.expected_exam_code.as_deref(), Some("AI-102"));
    }

    #[test]
    fn env_alone_sets_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let vars = env(&[
            ("EXAM_GUIDE_OUT_DIR", "dist"),
            ("EXAM_GUIDE_EXPECTED_EXAM_CODE", "AI-900"),
            ("OTHER_TOOL_OUT_DIR", "ignored"),
        ]);
        let s = Settings::layered(Some(&path), vars).unwrap();
        assert_eq!(s.out_dir, PathBuf::from("dist"));
        assert_eq!(s.rules().expected_exam_code.as_deref(), Some("AI-900"));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
