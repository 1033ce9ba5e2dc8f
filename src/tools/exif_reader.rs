use super::capture_time::{CaptureDate, CaptureTimeReader, DateProbe};
use chrono::NaiveDate;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 讀取照片 EXIF `DateTimeOriginal` 的拍攝時間
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifCaptureReader;

impl ExifCaptureReader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CaptureTimeReader for ExifCaptureReader {
    fn read_capture_time(&self, path: &Path) -> DateProbe {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return DateProbe::Errored(format!("無法開啟檔案: {e}")),
        };
        let mut reader = BufReader::new(file);

        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => {
                debug!("沒有 EXIF 資料: {}", path.display());
                return DateProbe::Absent;
            }
            Err(e) => return DateProbe::Errored(format!("無法解析 EXIF: {e}")),
        };

        let Some(field) = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY) else {
            return DateProbe::Absent;
        };

        match &field.value {
            exif::Value::Ascii(values) if !values.is_empty() => parse_exif_datetime(&values[0])
                .map_or_else(
                    || {
                        DateProbe::Errored(format!(
                            "DateTimeOriginal 格式錯誤: {}",
                            String::from_utf8_lossy(&values[0])
                        ))
                    },
                    DateProbe::Present,
                ),
            _ => DateProbe::Errored("DateTimeOriginal 不是 ASCII 值".to_string()),
        }
    }
}

/// 解析 `YYYY:MM:DD HH:MM:SS`
fn parse_exif_datetime(raw: &[u8]) -> Option<CaptureDate> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    let datetime = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))?;
    Some(CaptureDate::new(datetime))
}
