//! Google Cloud Vision API連携
//!
//! `images:annotate` に LABEL_DETECTION と TEXT_DETECTION を要求し、
//! ラベル・数字列（バーコード）・OCR単語を Detection に変換する。

use super::{prepare_image, Classifier};
use crate::config::Config;
use crate::error::{RecognizerError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ingredient_recognizer_common::Detection;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

lazy_static! {
    /// EAN-8 〜 GTIN-14 相当の数字列
    static ref BARCODE_TOKEN: Regex = Regex::new(r"^\d{8,14}$").unwrap();
}

/// OCRで読み取ったバーコードの信頼度（バーコードはプレフィックス規則とのみ照合される）
const BARCODE_CONFIDENCE: f32 = 1.0;

/// OCR単語の信頼度。ラベルより常に下位になる
const TEXT_CONFIDENCE: f32 = 0.0;

/// Vision APIリクエスト
#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
}

/// Vision APIレスポンス
#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnnotateImageResponse {
    label_annotations: Vec<EntityAnnotation>,
    text_annotations: Vec<EntityAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntityAnnotation {
    description: String,
    score: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiStatus {
    code: i32,
    message: String,
}

/// Cloud Vision を使う分類器
pub struct VisionClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_image_size: u32,
    max_label_results: u32,
    timeout_seconds: u64,
}

impl VisionClassifier {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| RecognizerError::ApiCall(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_image_size: 0,
            max_label_results: 10,
            timeout_seconds,
        })
    }

    /// 設定から構築（APIキー必須）
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let mut classifier = Self::new(&config.vision_endpoint, api_key, config.timeout_seconds)?;
        classifier.max_image_size = config.max_image_size;
        classifier.max_label_results = config.max_label_results;
        Ok(classifier)
    }

    fn build_request(&self, image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![
                    Feature {
                        kind: "LABEL_DETECTION",
                        max_results: Some(self.max_label_results),
                    },
                    Feature {
                        kind: "TEXT_DETECTION",
                        max_results: None,
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl Classifier for VisionClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Vec<Detection>> {
        let prepared = prepare_image(image, self.max_image_size)?;
        let request = self.build_request(&prepared);

        debug!(bytes = prepared.len(), "Vision API request");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognizerError::Timeout(self.timeout_seconds)
                } else {
                    RecognizerError::ApiCall(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RecognizerError::ApiCall(format!(
                "Vision API error {}: {}",
                status, text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RecognizerError::ApiCall(e.to_string()))?;

        parse_annotate_response(&body)
    }

    fn name(&self) -> &str {
        "google-vision"
    }
}

/// annotateレスポンスを Detection に変換
fn parse_annotate_response(body: &str) -> Result<Vec<Detection>> {
    let parsed: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| RecognizerError::ApiParse(format!("Vision JSONパースエラー: {}", e)))?;

    let Some(first) = parsed.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(err) = first.error {
        return Err(RecognizerError::ApiCall(format!(
            "Vision API error {}: {}",
            err.code, err.message
        )));
    }

    let mut detections: Vec<Detection> = first
        .label_annotations
        .into_iter()
        .filter(|a| !a.description.trim().is_empty())
        .map(|a| Detection::new(a.description, a.score))
        .collect();

    // textAnnotations[0] は全文、以降が単語単位
    for token in first.text_annotations.iter().skip(1).map(|a| a.description.trim()) {
        if BARCODE_TOKEN.is_match(token) {
            detections.push(Detection::barcode(token, BARCODE_CONFIDENCE));
        } else if token.chars().any(char::is_alphabetic) {
            detections.push(Detection::text(token, TEXT_CONFIDENCE));
        }
    }

    Ok(detections)
}
