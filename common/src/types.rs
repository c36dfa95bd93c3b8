//! 認識結果の型定義
//!
//! - Detection: 外部分類器が返す (ラベル, 信頼度) の組
//! - Resolution: カテゴリ照合の最終出力

use serde::{Deserialize, Serialize};

/// 照合できなかった場合の食材名・カテゴリ名
pub const UNKNOWN: &str = "Unknown";

/// 検出の種類
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    /// ラベル検出（キーワード照合の対象）
    #[default]
    Label,
    /// OCRテキスト
    Text,
    /// バーコード（プレフィックス照合の対象）
    Barcode,
}

/// 分類器の検出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(default)]
    pub kind: DetectionKind,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            kind: DetectionKind::Label,
        }
    }

    pub fn barcode(code: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: code.into(),
            confidence,
            kind: DetectionKind::Barcode,
        }
    }

    pub fn text(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: text.into(),
            confidence,
            kind: DetectionKind::Text,
        }
    }
}

/// カテゴリ照合結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub ingredient: String,
    pub category: String,
}

impl Resolution {
    pub fn new(ingredient: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            ingredient: ingredient.into(),
            category: category.into(),
        }
    }

    /// Unknown/Unknown
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.category == UNKNOWN
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::unknown()
    }
}
