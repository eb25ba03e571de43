use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub planner: PlannerConfig,
}

/// 日志配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "sqlplan".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
        }
    }
}

/// 计划器配置
///
/// `properties` 是规则按名称读取的自由属性，例如 `bloomFilterMaxSelectivity`
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PlannerConfig {
    /// 新建索引扫描时是否把 OR 展开列计入等值前缀
    pub include_union_as_equality: bool,
    /// 计划文本输出中每层缩进的空格数
    pub plan_dump_indent: usize,
    pub properties: BTreeMap<String, String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            include_union_as_equality: false,
            plan_dump_indent: 2,
            properties: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.planner.plan_dump_indent == 0 {
            return Err("plan_dump_indent 必须大于 0".into());
        }
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.planner.plan_dump_indent, 2);
        assert!(!config.planner.include_union_as_equality);
    }

    #[test]
    fn test_config_load_save() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");

        let mut config = Config::default();
        config
            .planner
            .properties
            .insert("bloomFilterMaxSelectivity".to_string(), "0.05".to_string());
        let toml_content =
            toml::to_string_pretty(&config).expect("Failed to serialize config to TOML");
        temp_file
            .write_all(toml_content.as_bytes())
            .expect("Failed to write TOML content to temporary file");

        let loaded_config =
            Config::load(temp_file.path()).expect("Failed to load config from temporary file");
        assert_eq!(config.log.file, loaded_config.log.file);
        assert_eq!(
            loaded_config.planner.properties.get("bloomFilterMaxSelectivity"),
            Some(&"0.05".to_string())
        );
    }

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        temp_file
            .write_all(b"[planner]\ninclude_union_as_equality = true\n")
            .expect("Failed to write TOML content to temporary file");

        let loaded = Config::load(temp_file.path()).expect("Failed to load config");
        assert!(loaded.planner.include_union_as_equality);
        assert_eq!(loaded.planner.plan_dump_indent, 2);
        assert_eq!(loaded.log.level, "info");
    }

    #[test]
    fn test_config_rejects_zero_indent() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        temp_file
            .write_all(b"[planner]\nplan_dump_indent = 0\n")
            .expect("Failed to write TOML content to temporary file");

        assert!(Config::load(temp_file.path()).is_err());
    }
}
