use chrono::{Datelike, NaiveDateTime};
use std::path::Path;

/// 媒體檔案內嵌的拍攝時間
///
/// 只有年、月用於決定目標資料夾，其餘欄位保留供記錄使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureDate(NaiveDateTime);

impl CaptureDate {
    #[must_use]
    pub const fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }

    #[must_use]
    pub const fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// `YYYYMM`，年補滿四位、月補滿兩位
    #[must_use]
    pub fn folder_name(&self) -> String {
        format!("{:04}{:02}", self.0.year(), self.0.month())
    }
}

impl From<NaiveDateTime> for CaptureDate {
    fn from(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }
}

/// 讀取中繼資料的結果，錯誤原因在此仍保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateProbe {
    Present(CaptureDate),
    Absent,
    Errored(String),
}

/// 從檔案路徑取得拍攝時間的能力（照片 EXIF、影片容器等）
pub trait CaptureTimeReader: Send + Sync {
    fn read_capture_time(&self, path: &Path) -> DateProbe;
}
