use anyhow::Context;
use clap::Parser;
use ingredient_recognizer::{batch, classifier, cli, config, scanner, server};
use ingredient_recognizer::error::RecognizerError;
use ingredient_recognizer::recognizer::Recognizer;
use ingredient_recognizer_common::{resolve, CategoryTable, Detection};
use cli::{Cli, Commands};
use config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "ingredient_recognizer=debug"
    } else {
        "ingredient_recognizer=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_table(config: &Config) -> anyhow::Result<Arc<CategoryTable>> {
    let table = CategoryTable::from_file(&config.categories_path).with_context(|| {
        format!(
            "カテゴリ定義の読み込みに失敗: {}",
            config.categories_path.display()
        )
    })?;
    Ok(Arc::new(table))
}

fn build_recognizer(config: &Config) -> anyhow::Result<Recognizer> {
    let table = load_table(config)?;
    let vision = classifier::VisionClassifier::from_config(config)?;
    Ok(Recognizer::from_config(Arc::new(vision), table, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = Config::load()?;
    if let Some(path) = cli.categories.clone() {
        config.categories_path = path;
    }
    if let Some(policy) = cli.policy {
        config.match_policy = policy;
    }
    if let Some(n) = cli.candidates {
        config.max_candidates = n;
    }

    match cli.command {
        Commands::Serve { host, port } => {
            let recognizer = build_recognizer(&config)?;
            let port = port.unwrap_or(config.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("待ち受けアドレスが不正です: {}:{}", host, port))?;

            tracing::info!(
                categories = recognizer.table().len(),
                policy = %config.match_policy,
                "category table loaded"
            );
            server::serve(addr, server::AppState { recognizer }, config.max_upload_bytes).await?;
        }

        Commands::Recognize { path, output } => {
            let recognizer = build_recognizer(&config)?;

            let images = scanner::scan_path(&path)?;
            if images.is_empty() {
                return Err(RecognizerError::NoImagesFound(path.display().to_string()).into());
            }
            eprintln!("✔ {}枚の画像を検出", images.len());

            let entries = batch::recognize_images(&recognizer, &images, images.len() > 1).await;
            let json = serde_json::to_string_pretty(&entries)?;

            match output {
                Some(output) => {
                    std::fs::write(&output, json)?;
                    eprintln!("✔ 結果を保存: {}", output.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Resolve { mut detections, barcodes } => {
            let table = load_table(&config)?;
            detections.extend(barcodes.into_iter().map(|b| Detection::barcode(b, 1.0)));

            let resolution = resolve(&detections, &table, &config.resolve_options());
            println!("{}", serde_json::to_string_pretty(&vec![resolution])?);
        }

        Commands::Categories => {
            let table = load_table(&config)?;
            println!("カテゴリ定義: {}", config.categories_path.display());
            println!("  カテゴリ数: {}", table.len());
            println!("  キーワード数: {}", table.keyword_count());
            for category in table.categories() {
                println!(
                    "  - {} ({}): {}",
                    category.name,
                    category.keywords.len(),
                    category.keywords.join(", ")
                );
                for rule in &category.barcodes {
                    println!("      バーコード {}* → {}", rule.prefix, rule.ingredient);
                }
            }
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                let mut stored = Config::load_file()?;
                stored.set_api_key(key.clone())?;
                config.api_key = Some(key);
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  エンドポイント: {}", config.vision_endpoint);
                println!("  カテゴリ定義: {}", config.categories_path.display());
                println!("  ポート: {}", config.port);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  照合ポリシー: {}", config.match_policy);
                println!("  候補数: {}", config.max_candidates);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
