//! 複数画像の一括認識
//!
//! 1枚の失敗は Unknown として記録し、残りの処理は続ける。

use crate::recognizer::Recognizer;
use crate::scanner::ImageInfo;
use indicatif::{ProgressBar, ProgressStyle};
use ingredient_recognizer_common::Resolution;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub file_name: String,
    pub file_path: String,
    pub results: Vec<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn recognize_images(
    recognizer: &Recognizer,
    images: &[ImageInfo],
    show_progress: bool,
) -> Vec<BatchEntry> {
    let pb = if show_progress {
        let pb = ProgressBar::new(images.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let mut entries = Vec::with_capacity(images.len());

    for img in images {
        if let Some(pb) = &pb {
            pb.set_message(img.file_name.clone());
        }

        let outcome = match tokio::fs::read(&img.path).await {
            Ok(bytes) => recognizer.try_recognize(&bytes).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let (results, error) = match outcome {
            Ok(results) => (results, None),
            Err(e) => {
                warn!(file = %img.file_name, error = %e, "recognition failed");
                (vec![Resolution::unknown()], Some(e))
            }
        };

        entries.push(BatchEntry {
            file_name: img.file_name.clone(),
            file_path: img.path.display().to_string(),
            results,
            error,
        });

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    entries
}
