use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 必需的 API 密钥名称（环境变量与 secrets.toml 共用）
pub const API_KEY_NAME: &str = "OPENROUTER_API_KEY";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 单个文档送入 LLM 的最大字符数
    pub max_text_chars: usize,
    /// 同时分析的文档数量
    pub max_concurrent_analyses: usize,
    // --- 输入输出 ---
    /// 待处理的 PDF 文件或目录
    pub pdf_inputs: Vec<PathBuf>,
    /// Excel 输出目录
    pub output_dir: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://openrouter.ai/api/v1".to_string(),
            llm_model_name: "openai/gpt-4o-mini".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 2048,
            max_text_chars: 60_000,
            max_concurrent_analyses: 1,
            pdf_inputs: vec![PathBuf::from("uploads")],
            output_dir: default_output_dir(),
            verbose_logging: false,
        }
    }
}

/// secrets.toml 的结构
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "OPENROUTER_API_KEY")]
    openrouter_api_key: Option<String>,
}

impl Config {
    /// 从进程环境加载配置
    ///
    /// 密钥优先取环境变量，其次取 `SECRETS_FILE`（默认 `secrets.toml`）中的同名项。
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 使用自定义查找函数加载配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let secrets_path = lookup("SECRETS_FILE").unwrap_or_else(|| "secrets.toml".to_string());

        let llm_api_key = match lookup(API_KEY_NAME).filter(|v| !v.trim().is_empty()) {
            Some(key) => key,
            None => read_secret_file(Path::new(&secrets_path))?
                .openrouter_api_key
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingSecret {
                    name: API_KEY_NAME.to_string(),
                })?,
        };

        let pdf_inputs = match lookup("PDF_INPUTS") {
            Some(raw) => parse_input_list(&raw),
            None => default.pdf_inputs,
        };

        Ok(Self {
            llm_api_key: llm_api_key.trim().to_string(),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: parse_var(&lookup, "LLM_TEMPERATURE", "f32")?
                .unwrap_or(default.llm_temperature),
            llm_max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", "u32")?
                .unwrap_or(default.llm_max_tokens),
            max_text_chars: parse_var(&lookup, "MAX_TEXT_CHARS", "usize")?
                .unwrap_or(default.max_text_chars),
            max_concurrent_analyses: parse_var(&lookup, "MAX_CONCURRENT_ANALYSES", "usize")?
                .unwrap_or(default.max_concurrent_analyses)
                .max(1),
            pdf_inputs,
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
        })
    }
}

/// 默认输出到用户的下载目录
fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn read_secret_file(path: &Path) -> Result<SecretsFile, ConfigError> {
    if !path.exists() {
        return Ok(SecretsFile::default());
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::SecretsFileUnreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    toml::from_str(&content).map_err(|e| ConfigError::SecretsFileUnreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parse_var<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

fn parse_input_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("absent.toml");
        let lookup = lookup_from(&[("SECRETS_FILE", secrets.to_str().unwrap())]);

        let err = Config::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("absent.toml");
        let lookup = lookup_from(&[
            (API_KEY_NAME, "   "),
            ("SECRETS_FILE", secrets.to_str().unwrap()),
        ]);

        assert!(Config::from_lookup(lookup).is_err());
    }

    #[test]
    fn test_key_falls_back_to_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = dir.path().join("secrets.toml");
        std::fs::write(&secrets, "OPENROUTER_API_KEY = \"sk-from-file\"\n").unwrap();
        let lookup = lookup_from(&[("SECRETS_FILE", secrets.to_str().unwrap())]);

        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.llm_api_key, "sk-from-file");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let lookup = lookup_from(&[
            (API_KEY_NAME, "sk-env"),
            ("LLM_MODEL_NAME", "anthropic/claude-3-haiku"),
            ("MAX_CONCURRENT_ANALYSES", "0"),
            ("PDF_INPUTS", "a.pdf, papers/ ,,"),
            ("VERBOSE_LOGGING", "true"),
        ]);

        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.llm_api_key, "sk-env");
        assert_eq!(config.llm_model_name, "anthropic/claude-3-haiku");
        assert_eq!(config.max_concurrent_analyses, 1);
        assert_eq!(
            config.pdf_inputs,
            vec![PathBuf::from("a.pdf"), PathBuf::from("papers/")]
        );
        assert!(config.verbose_logging);
        assert_eq!(config.llm_api_base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let lookup = lookup_from(&[(API_KEY_NAME, "sk-env"), ("LLM_MAX_TOKENS", "lots")]);

        match Config::from_lookup(lookup) {
            Err(ConfigError::InvalidValue { var_name, value, .. }) => {
                assert_eq!(var_name, "LLM_MAX_TOKENS");
                assert_eq!(value, "lots");
            }
            other => panic!("期望 InvalidValue，实际: {:?}", other),
        }
    }
}
