use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("カタログ定義が不正です: {reason}")]
    MalformedCatalog { reason: String },
    #[error("未知のリソースが参照されました: {id}")]
    UnknownResource { id: String },
    #[error("未知のアップグレードが参照されました: {id}")]
    UnknownUpgrade { id: String },
    #[error("購入できません: {id} ({reason})")]
    NotEligible { id: String, reason: String },
    #[error("リソースが不足しています: {resource} (必要 {required:.1} / 保有 {available:.1})")]
    InsufficientResource {
        resource: String,
        required: f64,
        available: f64,
    },
    #[error("セーブデータが不正です: {reason}")]
    MalformedSave { reason: String },
    #[error("セーブデータのバージョンに対応していません: {version}")]
    UnsupportedSaveVersion { version: u32 },
    #[error("時間の指定が不正です: {value}")]
    InvalidTimeInput { value: f64 },
    #[error("{year}年への時間スキップはできません")]
    SkipUnavailable { year: i32 },
}
