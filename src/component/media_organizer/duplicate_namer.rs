use super::error::OrganizeError;
use crate::tools::{ContentDigest, calculate_file_hash};
use anyhow::{Context, Result};
use log::debug;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 檔名後綴的嘗試上限
pub const MAX_NAME_SUFFIX: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    /// 可以安全寫入的檔名
    Available(OsString),
    /// 目標資料夾已有相同內容的檔案
    Duplicate(PathBuf),
}

enum Slot {
    Free,
    SameContent,
    Occupied,
}

/// 決定目標資料夾內不會覆蓋、也不會重複的檔名
///
/// 每個目標資料夾第一次用到時建立「檔案大小 -> 路徑」索引，內容比對只計算大小相同的檔案。
/// 同一次執行中算過或寫入過的摘要會被快取。不可在多個執行緒間同時對同一個目標資料夾使用。
#[derive(Debug)]
pub struct DuplicateAwareNamer {
    digest_cache: HashMap<PathBuf, ContentDigest>,
    folder_index: HashMap<PathBuf, HashMap<u64, Vec<PathBuf>>>,
    max_suffix: u32,
}

impl Default for DuplicateAwareNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateAwareNamer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_suffix(MAX_NAME_SUFFIX)
    }

    #[must_use]
    pub fn with_max_suffix(max_suffix: u32) -> Self {
        Self {
            digest_cache: HashMap::new(),
            folder_index: HashMap::new(),
            max_suffix,
        }
    }

    /// 資料夾內已有相同內容（不論檔名）時回傳 `Duplicate`；
    /// 否則依序嘗試 `name`、`{stem}_1{ext}`、`{stem}_2{ext}`…，第一個不存在的名稱即為結果
    pub fn resolve_name(
        &mut self,
        dest_folder: &Path,
        desired_name: &OsStr,
        src_digest: &ContentDigest,
    ) -> Result<NameResolution> {
        if let Some(existing) = self.find_same_content(dest_folder, src_digest)? {
            return Ok(NameResolution::Duplicate(existing));
        }

        let candidate = dest_folder.join(desired_name);
        match self.inspect(&candidate, src_digest)? {
            Slot::Free => return Ok(NameResolution::Available(desired_name.to_os_string())),
            Slot::SameContent => return Ok(NameResolution::Duplicate(candidate)),
            Slot::Occupied => {}
        }

        let desired = Path::new(desired_name);
        let stem = desired.file_stem().unwrap_or(desired_name);
        let ext = desired.extension();

        for counter in 1..=self.max_suffix {
            let name = suffixed_name(stem, counter, ext);
            let candidate = dest_folder.join(&name);
            match self.inspect(&candidate, src_digest)? {
                Slot::Free => return Ok(NameResolution::Available(name)),
                Slot::SameContent => return Ok(NameResolution::Duplicate(candidate)),
                Slot::Occupied => {}
            }
        }

        Err(OrganizeError::NameSpaceExhausted {
            folder: dest_folder.to_path_buf(),
            desired: desired_name.to_string_lossy().into_owned(),
            attempts: self.max_suffix,
        }
        .into())
    }

    /// 記錄剛寫入的目標檔摘要
    pub fn record(&mut self, path: PathBuf, digest: ContentDigest) {
        if let Some(index) = path.parent().and_then(|folder| self.folder_index.get_mut(folder)) {
            index.entry(digest.len()).or_default().push(path.clone());
        }
        self.digest_cache.insert(path, digest);
    }

    fn find_same_content(
        &mut self,
        dest_folder: &Path,
        src_digest: &ContentDigest,
    ) -> Result<Option<PathBuf>> {
        if !self.folder_index.contains_key(dest_folder) {
            let index = build_size_index(dest_folder)?;
            self.folder_index.insert(dest_folder.to_path_buf(), index);
        }

        let candidates = self
            .folder_index
            .get(dest_folder)
            .and_then(|index| index.get(&src_digest.len()))
            .cloned()
            .unwrap_or_default();

        for candidate in candidates {
            if self.digest_of(&candidate)? == *src_digest {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn digest_of(&mut self, path: &Path) -> Result<ContentDigest> {
        if let Some(digest) = self.digest_cache.get(path) {
            return Ok(*digest);
        }
        let digest = calculate_file_hash(path)?;
        self.digest_cache.insert(path.to_path_buf(), digest);
        Ok(digest)
    }

    fn inspect(&mut self, candidate: &Path, src_digest: &ContentDigest) -> Result<Slot> {
        let metadata = match fs::symlink_metadata(candidate) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Slot::Free),
            Err(e) => {
                return Err(e).with_context(|| format!("無法檢查檔案: {}", candidate.display()));
            }
        };

        if !metadata.is_file() {
            debug!("名稱被非一般檔案占用: {}", candidate.display());
            return Ok(Slot::Occupied);
        }

        if self.digest_of(candidate)? == *src_digest {
            Ok(Slot::SameContent)
        } else {
            Ok(Slot::Occupied)
        }
    }
}

/// `{stem}_{counter}.{ext}`
fn suffixed_name(stem: &OsStr, counter: u32, ext: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{counter}"));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// 掃描目標資料夾內的一般檔案，依大小分組；資料夾不存在時回傳空索引
fn build_size_index(folder: &Path) -> Result<HashMap<u64, Vec<PathBuf>>> {
    let mut index: HashMap<u64, Vec<PathBuf>> = HashMap::new();

    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(index),
        Err(e) => {
            return Err(e).with_context(|| format!("無法讀取目錄: {}", folder.display()));
        }
    };

    for entry in entries {
        let entry = entry.with_context(|| format!("無法讀取目錄項目: {}", folder.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // 其他程序中斷後留下的複製暫存檔
        if name.starts_with('.') && name.ends_with(".partial") {
            continue;
        }
        let metadata = entry
            .metadata()
            .with_context(|| format!("無法讀取檔案資訊: {}", entry.path().display()))?;
        if metadata.is_file() {
            index.entry(metadata.len()).or_default().push(entry.path());
        }
    }

    Ok(index)
}
