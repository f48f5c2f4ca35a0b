use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 永続化するのは導出元のみ。生産モディファイアは保存せず、ロード時に再計算する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveData {
    pub version: u32,
    pub resources: BTreeMap<String, f64>,
    pub owned_upgrades: Vec<String>,
    pub selected_exclusive: BTreeMap<String, String>,
    pub current_year: i32,
    #[serde(default)]
    pub resolved_events: Vec<String>,
}

impl SaveData {
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("セーブデータのシリアライズに失敗しました")?;
        fs::write(path, json)
            .with_context(|| format!("セーブファイルの書き込みに失敗しました: {}", path.display()))
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("セーブファイルの読み込みに失敗しました: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("セーブデータの解析に失敗しました: {}", path.display()))
    }
}
