//! 外部画像分類器との境界
//!
//! 分類器はトレイトオブジェクトとして注入し、
//! テストではネットワークなしの実装に差し替える。

mod image_prep;
pub mod vision;

pub use image_prep::prepare_image;
pub use vision::VisionClassifier;

use crate::error::Result;
use async_trait::async_trait;
use ingredient_recognizer_common::Detection;

/// 画像 → 検出結果
#[async_trait]
pub trait Classifier: Send + Sync {
    /// 画像バイト列を分類する（順序は保証しない）
    async fn classify(&self, image: &[u8]) -> Result<Vec<Detection>>;

    /// ログ表示用の名前
    fn name(&self) -> &str {
        "classifier"
    }
}
