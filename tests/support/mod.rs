//! テスト用の分類器とカテゴリ表

#![allow(dead_code)]

use async_trait::async_trait;
use ingredient_recognizer::classifier::Classifier;
use ingredient_recognizer::error::{RecognizerError, Result};
use ingredient_recognizer::recognizer::Recognizer;
use ingredient_recognizer_common::{CategoryTable, Detection, ResolveOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const CATEGORIES: &str = r#"{
    "categories": [
        { "name": "Grains", "ingredients": ["Pasta"], "keywords": ["pasta", "noodle"],
          "barcodes": [{ "prefix": "290000", "ingredient": "Spaghetti" }] },
        { "name": "Vegetables", "ingredients": ["Tomato"], "keywords": ["tomato"] },
        { "name": "Dairy", "keywords": ["cheese", "milk"] }
    ]
}"#;

pub fn table() -> Arc<CategoryTable> {
    Arc::new(CategoryTable::from_json(CATEGORIES).unwrap())
}

/// 常に同じ検出結果を返す
pub struct FixedClassifier {
    pub detections: Vec<Detection>,
    pub calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _image: &[u8]) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// 常に失敗する
pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _image: &[u8]) -> Result<Vec<Detection>> {
        Err(RecognizerError::ApiCall("quota exceeded".into()))
    }
}

/// 応答しない
pub struct HangingClassifier;

#[async_trait]
impl Classifier for HangingClassifier {
    async fn classify(&self, _image: &[u8]) -> Result<Vec<Detection>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

pub fn recognizer(classifier: Arc<dyn Classifier>) -> Recognizer {
    Recognizer::new(
        classifier,
        table(),
        ResolveOptions::default(),
        Duration::from_secs(5),
    )
}

pub fn recognizer_with_timeout(classifier: Arc<dyn Classifier>, timeout: Duration) -> Recognizer {
    Recognizer::new(classifier, table(), ResolveOptions::default(), timeout)
}
