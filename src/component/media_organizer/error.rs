use std::path::PathBuf;
use thiserror::Error;

/// 呼叫端需要區分的錯誤
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// 目標資料夾內找不到可用的檔名
    #[error("在 {folder} 中找不到 {desired} 的可用檔名（已嘗試 {attempts} 次）")]
    NameSpaceExhausted {
        folder: PathBuf,
        desired: String,
        attempts: u32,
    },

    /// 進度檢查點寫入失敗，後續續跑將不可靠，必須中止
    #[error("無法寫入進度檢查點 {path}: {source}")]
    CheckpointWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
