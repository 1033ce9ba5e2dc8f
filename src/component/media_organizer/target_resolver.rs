use crate::tools::CaptureDate;
use std::path::{Component, Path, PathBuf};

/// 無法分類的檔案放置的資料夾名稱
pub const SKIPPED_FOLDER: &str = "SKIPPED";

/// 檔案要複製到的目標資料夾
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// `<dest_root>/YYYYMM`
    Dated(PathBuf),
    /// `<dest_root>/SKIPPED/<來源相對路徑>`
    Unclassified(PathBuf),
}

impl Destination {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Dated(path) | Self::Unclassified(path) => path,
        }
    }

    #[must_use]
    pub const fn is_dated(&self) -> bool {
        matches!(self, Self::Dated(_))
    }
}

#[derive(Debug, Clone)]
pub struct TargetResolver {
    dest_root: PathBuf,
}

impl TargetResolver {
    #[must_use]
    pub fn new(dest_root: &Path) -> Self {
        Self {
            dest_root: dest_root.to_path_buf(),
        }
    }

    /// `relative_dir` 為相對於來源根目錄的路徑
    #[must_use]
    pub fn resolve(&self, capture_date: Option<&CaptureDate>, relative_dir: &Path) -> Destination {
        match capture_date {
            Some(date) => Destination::Dated(self.dest_root.join(date.folder_name())),
            None => {
                let mut folder = self.dest_root.join(SKIPPED_FOLDER);
                folder.extend(relative_dir.components().filter_map(|c| match c {
                    Component::Normal(part) => Some(part),
                    _ => None,
                }));
                Destination::Unclassified(folder)
            }
        }
    }
}
