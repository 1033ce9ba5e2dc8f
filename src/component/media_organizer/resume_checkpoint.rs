use super::error::OrganizeError;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 放在目標根目錄下的檢查點檔名
pub const CHECKPOINT_FILE: &str = ".organize_checkpoint";

/// 記錄「最後一個完整處理完的來源資料夾」
pub trait CheckpointStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, relative_dir: &str) -> Result<()>;
}

/// 以純文字檔保存檢查點，寫入時先寫暫存檔再 rename 覆蓋
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    #[must_use]
    pub fn new(dest_root: &Path) -> Self {
        Self {
            path: dest_root.join(CHECKPOINT_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 刪除檢查點（僅由使用者明確選擇重新開始時呼叫）
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("無法刪除檢查點: {}", self.path.display()))?;
        }
        Ok(())
    }

    fn write_atomically(&self, relative_dir: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self
            .path
            .with_file_name(format!("{CHECKPOINT_FILE}.{}.tmp", Uuid::new_v4().simple()));

        let result = (|| {
            let mut file = File::create(&temp_path)?;
            file.write_all(relative_dir.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("無法讀取檢查點: {}", self.path.display()))?;

        let value = content.lines().next().unwrap_or_default();
        if value.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(value.to_string()))
    }

    fn save(&mut self, relative_dir: &str) -> Result<()> {
        self.write_atomically(relative_dir).map_err(|source| {
            anyhow::Error::from(OrganizeError::CheckpointWrite {
                path: self.path.clone(),
                source,
            })
        })
    }
}

/// 記憶體中的檢查點，保留每次寫入的值
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    value: Option<String>,
    history: Vec<String>,
    fail_saves: bool,
}

impl MemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// 每次 save 都失敗
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.clone().filter(|v| !v.trim().is_empty()))
    }

    fn save(&mut self, relative_dir: &str) -> Result<()> {
        if self.fail_saves {
            return Err(OrganizeError::CheckpointWrite {
                path: PathBuf::from(CHECKPOINT_FILE),
                source: std::io::Error::other("simulated write failure"),
            }
            .into());
        }
        self.value = Some(relative_dir.to_string());
        self.history.push(relative_dir.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_absent_on_first_run() {
        let dest = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dest.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dest = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dest.path());

        store.save("2023/trip").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("2023/trip"));

        store.save("misc").unwrap();
        let reopened = FileCheckpointStore::new(dest.path());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("misc"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dest = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dest.path());
        store.save(".").unwrap();

        let names: Vec<String> = fs::read_dir(dest.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CHECKPOINT_FILE.to_string()]);
    }

    #[test]
    fn test_empty_file_is_absent() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join(CHECKPOINT_FILE), "  \n").unwrap();
        assert_eq!(FileCheckpointStore::new(dest.path()).load().unwrap(), None);
    }

    #[test]
    fn test_save_failure_is_typed() {
        let dest = TempDir::new().unwrap();
        // 目標根目錄其實是一個檔案，無法在底下建立檢查點
        let bogus_root = dest.path().join("not_a_dir");
        fs::write(&bogus_root, "x").unwrap();
        let mut store = FileCheckpointStore::new(&bogus_root);

        let err = store.save("2023").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrganizeError>(),
            Some(OrganizeError::CheckpointWrite { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let dest = TempDir::new().unwrap();
        let mut store = FileCheckpointStore::new(dest.path());
        store.save("2023").unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_history() {
        let mut store = MemoryCheckpointStore::new();
        store.save("a").unwrap();
        store.save("b").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("b"));
        assert_eq!(store.history(), ["a".to_string(), "b".to_string()]);
        assert!(MemoryCheckpointStore::failing().save("a").is_err());
    }
}
