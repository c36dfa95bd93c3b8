use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`ingredient-recognizer config --set-api-key YOUR_KEY` または GOOGLE_VISION_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("API呼び出しがタイムアウトしました ({0}秒)")]
    Timeout(u64),

    #[error("画像認識を利用できません: {0}")]
    RecognitionUnavailable(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] ingredient_recognizer_common::Error),
}

pub type Result<T> = std::result::Result<T, RecognizerError>;
