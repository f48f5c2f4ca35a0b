mod cli;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use industria_core::{Catalog, GameBuilder, GameConfig, GameState, load_events_from_str};

fn main() -> Result<()> {
    let (mut game, config) = match resolve_config_dir() {
        Some(dir) => build_from_dir(&dir)?,
        None => build_embedded()?,
    };
    cli::run(&mut game, &config)
}

fn build_embedded() -> Result<(GameState, GameConfig)> {
    let config = GameConfig::from_embedded()?;
    let game = GameState::from_embedded().context("組み込み定義の読み込みに失敗しました")?;
    Ok((game, config))
}

fn build_from_dir(dir: &Path) -> Result<(GameState, GameConfig)> {
    let catalog = Catalog::load_from_dir(dir)
        .with_context(|| format!("カタログの読み込みに失敗しました: {}", dir.display()))?;
    let config = GameConfig::load_or_default(dir.join("settings.yaml"))?;

    let events_path = dir.join("events.yaml");
    let events = if events_path.exists() {
        let content = fs::read_to_string(&events_path).with_context(|| {
            format!(
                "イベント定義の読み込みに失敗しました: {}",
                events_path.display()
            )
        })?;
        load_events_from_str(&content)?
    } else {
        Vec::new()
    };

    let game = GameBuilder::new(catalog)
        .with_config(config.clone())
        .with_events(events)
        .build()?;
    Ok((game, config))
}

fn resolve_config_dir() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config"));
    }
    candidates.push(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("config"),
    );
    candidates
        .into_iter()
        .find(|path| path.join("resources.yaml").exists())
}
