//! Ingredient Recognizer
//!
//! 画像を外部の画像分類APIに渡し、検出ラベルを食材カテゴリ表と照合する。

pub mod batch;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod recognizer;
pub mod scanner;
pub mod server;
