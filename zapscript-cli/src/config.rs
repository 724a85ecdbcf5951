//! # Config 模块
//!
//! 命令行工具的可选 JSON 配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (zapscript.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use zapscript::ArgExprEnv;

/// 未指定 `--config` 时读取的文件
pub const DEFAULT_CONFIG_PATH: &str = "zapscript.json";

/// 工具配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 日志级别（off/error/warn/info/debug/trace）
    pub log_level: Option<String>,

    /// 是否美化 JSON 输出
    pub pretty: bool,

    /// `eval` 子命令使用的表达式环境
    pub env: ArgExprEnv,
}

impl CliConfig {
    /// 加载配置文件
    ///
    /// 显式指定的路径必须存在；默认路径不存在时返回默认配置。
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                bail!("配置文件不存在: {}", path.display());
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("配置文件读取失败: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))
    }

    /// 计算日志级别
    ///
    /// `-v` 出现时优先于配置文件：无 `-v` 为 warn，依次为 info、debug、trace。
    pub fn level_filter(&self, verbose: u8) -> anyhow::Result<LevelFilter> {
        if verbose > 0 {
            return Ok(match verbose {
                1 => LevelFilter::INFO,
                2 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            });
        }

        match self.log_level.as_deref() {
            Some(level) => LevelFilter::from_str(level)
                .map_err(|_| anyhow::anyhow!("无效的日志级别: {level}")),
            None => Ok(LevelFilter::WARN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(!config.pretty);
        assert_eq!(config.log_level, None);
        assert_eq!(config.level_filter(0).unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn test_load_partial_config() {
        let file = write_config(r#"{"pretty": true, "env": {"platform": "mister"}}"#);
        let config = CliConfig::load(Some(file.path())).unwrap();

        assert!(config.pretty);
        assert_eq!(config.env.platform, "mister");
        assert_eq!(config.env.device.hostname, "");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("配置文件不存在"));
    }

    #[test]
    fn test_load_invalid_json() {
        let file = write_config("{not json");
        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("配置文件解析失败"));
    }

    #[test]
    fn test_level_filter() {
        let config = CliConfig {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(config.level_filter(0).unwrap(), LevelFilter::DEBUG);
        // -v 覆盖配置文件
        assert_eq!(config.level_filter(1).unwrap(), LevelFilter::INFO);
        assert_eq!(config.level_filter(5).unwrap(), LevelFilter::TRACE);

        let config = CliConfig {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(config.level_filter(0).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = CliConfig {
            log_level: Some("info".to_string()),
            pretty: true,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let loaded: CliConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }
}
