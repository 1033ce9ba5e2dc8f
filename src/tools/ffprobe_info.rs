use super::capture_time::{CaptureDate, CaptureTimeReader, DateProbe};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    tags: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct StreamInfo {
    tags: Option<HashMap<String, String>>,
}

/// 使用 ffprobe 讀取影片容器的 `creation_time`
#[derive(Debug, Clone)]
pub struct FfprobeCreationReader {
    program: String,
}

impl Default for FfprobeCreationReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeCreationReader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// 指定 ffprobe 執行檔路徑
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn probe(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffprobe 執行失敗: {stderr}");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CaptureTimeReader for FfprobeCreationReader {
    fn read_capture_time(&self, path: &Path) -> DateProbe {
        let parsed = self.probe(path).and_then(|json| parse_creation_time(&json));
        match parsed {
            Ok(Some(date)) => DateProbe::Present(date),
            Ok(None) => DateProbe::Absent,
            Err(e) => DateProbe::Errored(format!("{e:#}")),
        }
    }
}

/// 從 ffprobe JSON 輸出取得建立時間（優先從 format，其次從第一個帶有該標籤的 stream）
fn parse_creation_time(json: &str) -> Result<Option<CaptureDate>> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    let from_format = probe
        .format
        .as_ref()
        .and_then(|f| f.tags.as_ref())
        .and_then(|tags| tags.get("creation_time"));

    let raw = from_format.or_else(|| {
        probe.streams.as_ref().and_then(|streams| {
            streams
                .iter()
                .find_map(|s| s.tags.as_ref().and_then(|tags| tags.get("creation_time")))
        })
    });

    let Some(raw) = raw else {
        return Ok(None);
    };

    let datetime = parse_timestamp(raw)
        .with_context(|| format!("無法解析 creation_time: {raw}"))?;
    Ok(Some(CaptureDate::new(datetime)))
}

/// 支援 RFC 3339（例如 "2023-06-01T10:20:30.000000Z"）與 "2023-06-01 10:20:30"
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(Into::into)
}
