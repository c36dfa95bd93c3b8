//! 画像認識 → カテゴリ照合
//!
//! 分類器の失敗はリクエスト単位で Unknown に落とし、
//! バッチ全体やサーバーを止めない。

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{RecognizerError, Result};
use ingredient_recognizer_common::{resolve, CategoryTable, Detection, Resolution, ResolveOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Recognizer {
    classifier: Arc<dyn Classifier>,
    table: Arc<CategoryTable>,
    options: ResolveOptions,
    timeout: Duration,
}

impl Recognizer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        table: Arc<CategoryTable>,
        options: ResolveOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            table,
            options,
            timeout,
        }
    }

    /// 設定の照合オプションとタイムアウトで構築
    pub fn from_config(
        classifier: Arc<dyn Classifier>,
        table: Arc<CategoryTable>,
        config: &Config,
    ) -> Self {
        Self::new(
            classifier,
            table,
            config.resolve_options(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// 分類器を呼び出す（タイムアウト付き）
    pub async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>> {
        match tokio::time::timeout(self.timeout, self.classifier.classify(image)).await {
            Ok(result) => result,
            Err(_) => Err(RecognizerError::Timeout(self.timeout.as_secs())),
        }
    }

    /// 検出結果を照合（1要素のリストで返す）
    pub fn resolve(&self, detections: &[Detection]) -> Vec<Resolution> {
        for d in detections {
            info!(label = %d.label, score = d.confidence, kind = ?d.kind, "detection");
        }

        let resolution = resolve(detections, &self.table, &self.options);
        info!(
            ingredient = %resolution.ingredient,
            category = %resolution.category,
            "resolved"
        );
        vec![resolution]
    }

    /// 分類器の失敗を RecognitionUnavailable として返す
    pub async fn try_recognize(&self, image: &[u8]) -> Result<Vec<Resolution>> {
        let detections = self
            .detect(image)
            .await
            .map_err(|e| RecognizerError::RecognitionUnavailable(e.to_string()))?;

        if detections.is_empty() {
            info!("No labels detected");
        }

        Ok(self.resolve(&detections))
    }

    /// 分類器の失敗は Unknown に落とす
    pub async fn recognize(&self, image: &[u8]) -> Vec<Resolution> {
        match self.try_recognize(image).await {
            Ok(results) => results,
            Err(e) => {
                warn!(classifier = self.classifier.name(), error = %e, "recognition failed");
                vec![Resolution::unknown()]
            }
        }
    }
}
