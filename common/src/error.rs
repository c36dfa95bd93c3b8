//! カテゴリ定義の読み込みエラー

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("カテゴリ定義を読み込めません: {0}")]
    Io(#[from] std::io::Error),

    #[error("カテゴリ定義のJSONが不正です: {0}")]
    Json(#[from] serde_json::Error),

    /// 名前の重複・空のキーワード・数字以外のバーコードなど
    #[error("カテゴリ定義エラー: {0}")]
    InvalidCategory(String),
}

pub type Result<T> = std::result::Result<T, Error>;
