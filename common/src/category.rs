//! カテゴリ定義モジュール
//!
//! 食材カテゴリ（名前・キーワード・表示用食材・バーコード規則）を
//! JSONファイルから読み込み、起動時に一度だけ検証する。
//! 読み込み後は不変で、複数のリクエストから同期なしで共有できる。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// バーコードのプレフィックス照合規則
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeRule {
    /// 数字のみのプレフィックス（例: "290000"）
    pub prefix: String,
    /// 一致したときに返す食材名
    pub ingredient: String,
}

impl BarcodeRule {
    pub fn matches(&self, code: &str) -> bool {
        code.starts_with(&self.prefix)
    }
}

/// 食材カテゴリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// 小文字・重複なし（定義順を維持）
    pub keywords: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barcodes: Vec<BarcodeRule>,
}

impl Category {
    /// 小文字化済みラベルとキーワードの完全一致
    pub fn has_keyword(&self, label: &str) -> bool {
        self.keywords.iter().any(|k| k == label)
    }

    /// キーワードのいずれかがラベルに含まれるか
    pub fn keyword_within(&self, label: &str) -> bool {
        self.keywords.iter().any(|k| label.contains(k.as_str()))
    }

    /// 最初に一致したバーコード規則
    pub fn barcode_rule(&self, code: &str) -> Option<&BarcodeRule> {
        self.barcodes.iter().find(|r| r.matches(code))
    }

    /// キーワードを正規化し、不正な定義をエラーにする
    fn normalize(mut self, index: usize) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::InvalidCategory(format!(
                "categories[{}]: name が空です",
                index
            )));
        }

        let mut seen = HashSet::new();
        self.keywords = self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.clone()))
            .collect();

        for rule in &mut self.barcodes {
            rule.prefix = rule.prefix.trim().to_string();
            if rule.prefix.is_empty() || !rule.prefix.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::InvalidCategory(format!(
                    "categories[{}] ({}): バーコードプレフィックスは数字のみ指定できます: {:?}",
                    index, self.name, rule.prefix
                )));
            }
            if rule.ingredient.trim().is_empty() {
                return Err(Error::InvalidCategory(format!(
                    "categories[{}] ({}): プレフィックス {} の ingredient が空です",
                    index, self.name, rule.prefix
                )));
            }
        }

        Ok(self)
    }
}

/// カテゴリ表（定義順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// JSONファイルから読み込み
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    ///
    /// `name` / `keywords` の欠落はここでエラーになる。
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: CategoryTable = serde_json::from_str(json)?;
        Self::new(raw.categories)
    }

    /// 検証済みのカテゴリ表を構築
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());

        for (i, category) in categories.into_iter().enumerate() {
            let category = category.normalize(i)?;
            if !names.insert(category.name.clone()) {
                return Err(Error::InvalidCategory(format!(
                    "カテゴリ名が重複しています: {}",
                    category.name
                )));
            }
            normalized.push(category);
        }

        Ok(Self {
            categories: normalized,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 全カテゴリのキーワード数
    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}
