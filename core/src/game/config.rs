use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::time::ClockSettings;

const EMBEDDED_SETTINGS: &str = include_str!("../../../config/settings.yaml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub time: TimeConfig,
    pub game: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub start_year: i32,
    pub years_per_second: f64,
    pub default_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start_year: 1800,
            years_per_second: 0.1,
            default_speed: 1.0,
            min_speed: 0.25,
            max_speed: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub autosave_interval_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_interval_seconds: 300.0,
        }
    }
}

impl GameConfig {
    pub fn from_embedded() -> Result<Self> {
        serde_yaml::from_str(EMBEDDED_SETTINGS).context("組み込み設定の解析に失敗しました")
    }

    /// 設定ファイルがなければ既定値。壊れたファイルはエラーにする。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("設定ファイルの読み込みに失敗しました: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("設定ファイルの解析に失敗しました: {}", path.display()))
    }

    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings {
            start_year: self.time.start_year,
            years_per_second: self.time.years_per_second,
            default_speed: self.time.default_speed,
            min_speed: self.time.min_speed,
            max_speed: self.time.max_speed,
        }
    }
}
