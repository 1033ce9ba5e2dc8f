use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 最近使用路徑的保留數量
pub const MAX_RECENT_PATHS: usize = 5;

/// 依副檔名判斷的媒體類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
    Unrecognized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaTypeTable {
    #[serde(rename = "PHOTO_FILE")]
    pub photo_file: Vec<String>,
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl MediaTypeTable {
    fn extensions_set(list: &[String]) -> HashSet<String> {
        list.iter().map(|ext| ext.to_lowercase()).collect()
    }

    /// 以副檔名（不分大小寫）分類檔案
    #[must_use]
    pub fn classify(&self, path: &Path) -> MediaKind {
        let Some(ext) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
        else {
            return MediaKind::Unrecognized;
        };

        if Self::extensions_set(&self.photo_file).contains(&ext) {
            MediaKind::Photo
        } else if Self::extensions_set(&self.video_file).contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Unrecognized
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::TraditionalChinese => "zh-TW",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::English, Self::TraditionalChinese]
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::TraditionalChinese => "繁體中文",
        }
    }
}

/// 使用者設定（settings.json）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub recent_source_paths: Vec<String>,
    pub recent_destination_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub media_type_table: MediaTypeTable,
    pub settings: UserSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MediaTypeTable {
        MediaTypeTable {
            photo_file: vec![".jpg".into(), ".jpeg".into(), ".png".into()],
            video_file: vec![".mov".into(), ".MP4".into()],
        }
    }

    #[test]
    fn test_classify_by_extension() {
        let table = table();
        assert_eq!(table.classify(Path::new("a/b.jpg")), MediaKind::Photo);
        assert_eq!(table.classify(Path::new("B.JPEG")), MediaKind::Photo);
        assert_eq!(table.classify(Path::new("clip.mp4")), MediaKind::Video);
        assert_eq!(table.classify(Path::new("clip.Mov")), MediaKind::Video);
        assert_eq!(table.classify(Path::new("notes.txt")), MediaKind::Unrecognized);
        assert_eq!(table.classify(Path::new("README")), MediaKind::Unrecognized);
    }

    #[test]
    fn test_settings_missing_fields_use_defaults() {
        let settings: UserSettings = serde_json::from_str(r#"{"language": "zh-TW"}"#).unwrap();
        assert_eq!(settings.language, Language::TraditionalChinese);
        assert!(settings.recent_source_paths.is_empty());
    }
}
