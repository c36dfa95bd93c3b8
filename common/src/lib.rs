//! Ingredient Recognizer Common Library
//!
//! サーバーとCLIで共有される型とカテゴリ照合ロジック

pub mod category;
pub mod error;
pub mod resolver;
pub mod types;

pub use category::{BarcodeRule, Category, CategoryTable};
pub use error::{Error, Result};
pub use resolver::{resolve, resolve_default, MatchPolicy, ResolveOptions};
pub use types::{Detection, DetectionKind, Resolution, UNKNOWN};
