use crate::error::{RecognizerError, Result};
use ingredient_recognizer_common::{MatchPolicy, ResolveOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub vision_endpoint: String,
    pub categories_path: PathBuf,
    pub port: u16,
    pub max_image_size: u32,
    pub max_label_results: u32,
    pub max_upload_bytes: usize,
    pub timeout_seconds: u64,
    pub match_policy: MatchPolicy,
    pub max_candidates: usize,
    pub min_confidence: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            vision_endpoint: DEFAULT_VISION_ENDPOINT.into(),
            categories_path: PathBuf::from("config/ingredientCategories.json"),
            port: 3000,
            max_image_size: 1600, // Cloud Vision推奨は640px以上
            max_label_results: 10,
            max_upload_bytes: 10 * 1024 * 1024,
            timeout_seconds: 15,
            match_policy: MatchPolicy::Exact,
            max_candidates: 1,
            min_confidence: 0.0,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 設定ファイルのみ（環境変数を反映しない）
    pub fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
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
            .ok_or_else(|| RecognizerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home
            .join(".config")
            .join("ingredient-recognizer")
            .join("config.json"))
    }

    /// CATEGORIES_PATH / PORT を反映（APIキーは get_api_key で参照）
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CATEGORIES_PATH").filter(|p| !p.trim().is_empty()) {
            self.categories_path = PathBuf::from(path);
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| RecognizerError::Config(format!("PORT が不正です: {}", port)))?;
        }

        Ok(())
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var("GOOGLE_VISION_API_KEY") {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(RecognizerError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            policy: self.match_policy,
            max_candidates: self.max_candidates.max(1),
            min_confidence: self.min_confidence,
        }
    }
}
