use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glyph_ocr::{
    config::Config,
    models::{FontIdentity, GlyphKey},
    render::OutlineGlyphRenderer,
    services::{FontRecognitionService, GlyphRenderer},
};

#[derive(Parser)]
#[command(name = "glyph-ocr")]
#[command(version)]
#[command(about = "Recover the characters drawn by glyph-obfuscated web fonts")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize the named glyphs of a font
    Glyph {
        font: PathBuf,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Recognize every glyph whose name carries the configured prefix
    All { font: PathBuf },
    /// Render one glyph to a PNG file without calling the OCR provider
    Render {
        font: PathBuf,
        key: String,
        #[arg(short, long, default_value = "glyph.png")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("glyph_ocr={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting glyph-ocr v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    match cli.command {
        Command::Glyph { font, keys } => {
            let bytes = read_font(&font).await?;
            let service = FontRecognitionService::from_config(&config)?;

            let mut glyphs = BTreeMap::new();
            for key in keys {
                let key = GlyphKey::new(key);
                let word = service.recognize_glyph(&bytes, &key).await;
                glyphs.insert(key, word);
            }
            print_json(&json!({
                "font": FontIdentity::of(&bytes).to_hex(),
                "glyphs": glyphs,
                "stats": service.stats(),
            }))?;
        }
        Command::All { font } => {
            let bytes = read_font(&font).await?;
            let service = FontRecognitionService::from_config(&config)?;

            let glyphs = service.recognize_all(&bytes).await;
            print_json(&json!({
                "font": FontIdentity::of(&bytes).to_hex(),
                "complete": glyphs.is_complete(),
                "glyphs": glyphs,
                "stats": service.stats(),
            }))?;
        }
        Command::Render { font, key, output } => {
            let bytes = read_font(&font).await?;
            let renderer = OutlineGlyphRenderer::new(&config.render);

            let image = renderer.render_glyph(&bytes, &GlyphKey::new(key))?;
            tokio::fs::write(&output, image.to_png()?)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            info!(
                "Wrote {}x{} glyph to {}",
                image.width(),
                image.height(),
                output.display()
            );
        }
    }

    Ok(())
}

async fn read_font(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading font {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
