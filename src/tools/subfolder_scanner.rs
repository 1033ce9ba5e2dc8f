use super::path_validator::relative_key;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 來源樹中的一個資料夾
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfolder {
    pub path: PathBuf,
    /// 相對於來源根目錄的路徑，根目錄為空路徑
    pub relative_path: PathBuf,
    /// 檢查點使用的識別字串（見 `relative_key`）
    pub relative: String,
}

/// 依走訪順序（前序、依名稱排序）列出來源樹中的所有資料夾
///
/// 不跟隨符號連結；`exclude` 底下的資料夾（例如位於來源樹內的目標根目錄）會被略過
pub fn scan_subfolders(root: &Path, exclude: Option<&Path>) -> Vec<Subfolder> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.is_none_or(|ex| !entry.path().starts_with(ex)))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("無法讀取目錄項目: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| {
            let relative_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(Path::new(""))
                .to_path_buf();
            Subfolder {
                relative: relative_key(&relative_path),
                relative_path,
                path: entry.into_path(),
            }
        })
        .collect()
}

/// 列出資料夾內（不遞迴）的檔案，依名稱排序
///
/// 指向一般檔案的符號連結會列入，複製時取其目標內容；目標不存在的連結也會列入，
/// 由後續讀取失敗回報錯誤。指向資料夾或其他特殊檔案的連結略過。
pub fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(directory).with_context(|| format!("無法讀取目錄: {}", directory.display()))?
    {
        let entry = entry.with_context(|| format!("無法讀取目錄項目: {}", directory.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("無法取得檔案類型: {}", entry.path().display()))?;
        let path = entry.path();
        if file_type.is_file() {
            files.push(path);
        } else if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) if target.is_file() => files.push(path),
                Ok(_) => debug!("略過不是指向一般檔案的連結: {}", path.display()),
                Err(e) => {
                    warn!("連結目標無法讀取: {} ({e})", path.display());
                    files.push(path);
                }
            }
        }
    }
    files.sort();
    Ok(files)
}
