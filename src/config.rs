use crate::error::{MlsCompareError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "MLS_COMPARE_BASE_URL";
pub const TOKEN_ENV: &str = "MLS_COMPARE_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
            // レポート生成はバックエンド側でPDF描画まで行うため長め
            timeout_seconds: 120,
            connect_timeout_seconds: 10,
            download_dir: None,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MlsCompareError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("mls-compare").join("config.json"))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(token) = non_empty_env(TOKEN_ENV) {
            self.token = Some(token);
        }
        self
    }

    /// CLI引数による上書き（最優先）
    pub fn apply_overrides(&mut self, base_url: Option<String>, token: Option<String>) {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }

    pub fn set_token(&mut self, token: String) -> Result<()> {
        self.token = Some(token);
        self.save()
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MlsCompareError::Config(format!("invalid base URL: {}", url)));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        self.save()
    }

    /// 表示用にトークンを伏せる
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = match self.token.as_deref() {
            None | Some("") => return "not set".to_string(),
            Some(token) => token.chars().collect(),
        };
        if chars.len() <= 8 {
            return "********".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.token.is_none());
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "token": "abc" }"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.connect_timeout_seconds, 10);
    }

    #[test]
    fn test_apply_overrides_trims_trailing_slash() {
        let mut config = Config::default();
        config.apply_overrides(Some("https://api.example.com/".into()), Some("t0k3n".into()));
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.token.as_deref(), Some("t0k3n"));
    }

    #[test]
    fn test_masked_token() {
        let mut config = Config::default();
        assert_eq!(config.masked_token(), "not set");
        config.token = Some("short".into());
        assert_eq!(config.masked_token(), "********");
        config.token = Some("eyJhbGciOiJSUzI1NiJ9.payload.sig".into());
        assert_eq!(config.masked_token(), "eyJh….sig");
    }
}
