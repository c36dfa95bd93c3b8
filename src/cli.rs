use clap::{Parser, Subcommand};
use ingredient_recognizer_common::{Detection, MatchPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ingredient-recognizer")]
#[command(about = "食材画像を認識してカテゴリを判定するAPIサーバー", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// カテゴリ定義JSON（省略時は設定ファイル / CATEGORIES_PATH）
    #[arg(short, long, global = true)]
    pub categories: Option<PathBuf>,

    /// キーワード照合ポリシー (exact/substring)
    #[arg(long, global = true)]
    pub policy: Option<MatchPolicy>,

    /// 照合を試す候補数（信頼度の高い順）
    #[arg(long, global = true)]
    pub candidates: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTPサーバーを起動
    Serve {
        /// 待ち受けアドレス
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// ポート番号（省略時は設定ファイル / PORT）
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// 画像ファイルまたはフォルダを認識してJSONを出力
    Recognize {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 検出結果を手入力して照合のみ実行（Vision APIを呼ばない）
    Resolve {
        /// ラベル検出 "ラベル:信頼度"（信頼度省略時は1.0）
        #[arg(short, long = "detection", value_parser = parse_detection)]
        detections: Vec<Detection>,

        /// バーコード "数字列"
        #[arg(short, long = "barcode")]
        barcodes: Vec<String>,
    },

    /// カテゴリ定義を検証して一覧表示
    Categories,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// "Pasta:0.91" → Detection
pub fn parse_detection(s: &str) -> Result<Detection, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("ラベルが空です".into());
    }

    match s.rsplit_once(':') {
        Some((label, score)) => {
            let confidence: f32 = score
                .trim()
                .parse()
                .map_err(|_| format!("信頼度が数値ではありません: {}", score))?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(format!("信頼度は0.0-1.0で指定してください: {}", confidence));
            }
            Ok(Detection::new(label.trim(), confidence))
        }
        None => Ok(Detection::new(s, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detection_with_score() {
        assert_eq!(parse_detection("Pasta:0.91").unwrap(), Detection::new("Pasta", 0.91));
    }

    #[test]
    fn test_parse_detection_without_score() {
        assert_eq!(parse_detection("Tomato").unwrap(), Detection::new("Tomato", 1.0));
    }

    #[test]
    fn test_parse_detection_invalid() {
        assert!(parse_detection("").is_err());
        assert!(parse_detection("Pasta:high").is_err());
        assert!(parse_detection("Pasta:1.5").is_err());
    }

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::parse_from([
            "ingredient-recognizer",
            "resolve",
            "-d",
            "Pasta:0.9",
            "--barcode",
            "2900001234567",
            "--policy",
            "substring",
        ]);
        assert_eq!(cli.policy, Some(MatchPolicy::Substring));
        match cli.command {
            Commands::Resolve { detections, barcodes } => {
                assert_eq!(detections.len(), 1);
                assert_eq!(barcodes, vec!["2900001234567"]);
            }
            _ => panic!("resolve expected"),
        }
    }
}
