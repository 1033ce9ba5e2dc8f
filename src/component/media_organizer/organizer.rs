use super::date_extractor::DateExtractor;
use super::duplicate_namer::{DuplicateAwareNamer, NameResolution};
use super::resume_checkpoint::CheckpointStore;
use super::target_resolver::{Destination, TargetResolver};
use crate::config::MediaTypeTable;
use crate::tools::{
    ContentDigest, Subfolder, calculate_file_hash, copy_preserving_mtime, list_files,
    scan_subfolders,
};
use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 走訪狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizerState {
    /// 略過已完成的資料夾，直到遇到 `resume_after`
    Scanning { resume_after: String },
    Processing,
    Done,
}

impl OrganizerState {
    #[must_use]
    pub fn initial(checkpoint: Option<String>) -> Self {
        match checkpoint {
            Some(resume_after) if !resume_after.trim().is_empty() => {
                Self::Scanning { resume_after }
            }
            _ => Self::Processing,
        }
    }

    /// 走訪到一個資料夾：回傳是否要處理它，並推進狀態
    ///
    /// 檢查點記錄的是已完成的資料夾，因此比對成功的那一個本身仍會被略過
    pub fn visit(&mut self, relative: &str) -> bool {
        match self {
            Self::Scanning { resume_after } => {
                if resume_after == relative {
                    *self = Self::Processing;
                }
                false
            }
            Self::Processing => true,
            Self::Done => false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub subfolders_total: usize,
    pub subfolders_skipped: usize,
    pub subfolders_completed: usize,
    pub files_copied: usize,
    pub duplicates_skipped: usize,
    pub files_dated: usize,
    pub files_unclassified: usize,
    pub errors: usize,
    /// 本次從哪個檢查點之後開始
    pub resumed_after: Option<String>,
    /// 檢查點指向的資料夾已不存在，改為全部處理
    pub resume_point_missing: bool,
    /// 第一個未完整處理的資料夾，之後不再更新檢查點
    pub checkpoint_frozen_at: Option<String>,
    pub interrupted: bool,
}

struct PreparedFile {
    source: PathBuf,
    file_name: OsString,
    destination: Destination,
    digest: Result<ContentDigest>,
}

enum FileOutcome {
    Copied,
    Duplicate,
}

enum SubfolderOutcome {
    Complete,
    Incomplete,
    Interrupted,
}

/// 依拍攝日期整理媒體檔案，可中斷後續跑
pub struct Organizer {
    source_root: PathBuf,
    dest_root: PathBuf,
    media_type_table: MediaTypeTable,
    date_extractor: DateExtractor,
    target_resolver: TargetResolver,
    shutdown_signal: Arc<AtomicBool>,
    show_progress: bool,
}

impl Organizer {
    pub fn new(
        source_root: &Path,
        dest_root: &Path,
        media_type_table: MediaTypeTable,
        date_extractor: DateExtractor,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            dest_root: dest_root.to_path_buf(),
            media_type_table,
            date_extractor,
            target_resolver: TargetResolver::new(dest_root),
            shutdown_signal,
            show_progress: false,
        }
    }

    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// 執行整理
    ///
    /// 單一檔案的錯誤只會記錄並略過；檢查點寫入失敗則立即中止並回傳錯誤
    pub fn run(&self, checkpoint: &mut dyn CheckpointStore) -> Result<OrganizeSummary> {
        info!(
            "開始整理: {} -> {}",
            self.source_root.display(),
            self.dest_root.display()
        );

        let subfolders = scan_subfolders(&self.source_root, self.excluded_destination());
        let mut summary = OrganizeSummary {
            subfolders_total: subfolders.len(),
            ..OrganizeSummary::default()
        };

        let mut state = self.initial_state(checkpoint.load()?, &subfolders, &mut summary);
        debug!("初始狀態: {state:?}");

        let mut namer = DuplicateAwareNamer::new();
        let progress_bar = self.create_progress_bar(subfolders.len() as u64);

        for subfolder in &subfolders {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }

            progress_bar.set_message(subfolder.relative.clone());

            if !state.visit(&subfolder.relative) {
                debug!("略過已完成的資料夾: {}", subfolder.relative);
                summary.subfolders_skipped += 1;
                progress_bar.inc(1);
                continue;
            }

            match self.process_subfolder(subfolder, &mut namer, &mut summary) {
                SubfolderOutcome::Complete => {
                    summary.subfolders_completed += 1;
                    if summary.checkpoint_frozen_at.is_none() {
                        if let Err(e) = checkpoint.save(&subfolder.relative) {
                            progress_bar.abandon();
                            return Err(e);
                        }
                        info!("資料夾完成: {}", subfolder.relative);
                    }
                }
                SubfolderOutcome::Incomplete => {
                    if summary.checkpoint_frozen_at.is_none() {
                        warn!(
                            "資料夾 {} 有檔案處理失敗，本次執行不再更新檢查點",
                            subfolder.relative
                        );
                        summary.checkpoint_frozen_at = Some(subfolder.relative.clone());
                    }
                }
                SubfolderOutcome::Interrupted => {
                    warn!("收到中斷訊號，資料夾 {} 未完成", subfolder.relative);
                    summary.interrupted = true;
                    break;
                }
            }

            progress_bar.inc(1);
        }

        if summary.interrupted {
            progress_bar.abandon();
        } else {
            progress_bar.finish_and_clear();
            state = OrganizerState::Done;
        }
        debug!("結束狀態: {state:?}");

        info!(
            "整理完成 - 複製: {}, 重複: {}, 有日期: {}, 無日期: {}, 錯誤: {}, 略過資料夾: {}",
            summary.files_copied,
            summary.duplicates_skipped,
            summary.files_dated,
            summary.files_unclassified,
            summary.errors,
            summary.subfolders_skipped
        );

        Ok(summary)
    }

    fn initial_state(
        &self,
        checkpoint: Option<String>,
        subfolders: &[Subfolder],
        summary: &mut OrganizeSummary,
    ) -> OrganizerState {
        let state = OrganizerState::initial(checkpoint);

        if let OrganizerState::Scanning { resume_after } = &state {
            if !subfolders.iter().any(|s| &s.relative == resume_after) {
                warn!("檢查點指向的資料夾已不存在: {resume_after}，將重新處理全部資料夾");
                summary.resume_point_missing = true;
                return OrganizerState::Processing;
            }
            info!("從檢查點之後繼續: {resume_after}");
            summary.resumed_after = Some(resume_after.clone());
        }

        state
    }

    /// 目標根目錄位於來源樹內時，走訪需排除它
    fn excluded_destination(&self) -> Option<&Path> {
        (self.dest_root != self.source_root && self.dest_root.starts_with(&self.source_root))
            .then_some(self.dest_root.as_path())
    }

    fn process_subfolder(
        &self,
        subfolder: &Subfolder,
        namer: &mut DuplicateAwareNamer,
        summary: &mut OrganizeSummary,
    ) -> SubfolderOutcome {
        let files = match list_files(&subfolder.path) {
            Ok(files) => files,
            Err(e) => {
                error!("{e:#}");
                summary.errors += 1;
                return SubfolderOutcome::Incomplete;
            }
        };

        // 讀取日期與計算摘要只讀取來源檔，可以平行處理；複製則依序進行
        let prepared: Vec<PreparedFile> = files
            .par_iter()
            .map(|path| self.prepare(path, &subfolder.relative_path))
            .collect();

        let mut complete = true;
        for file in prepared {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                return SubfolderOutcome::Interrupted;
            }

            let dated = file.destination.is_dated();
            let source = file.source.clone();
            match self.commit(file, namer) {
                Ok(outcome) => {
                    match outcome {
                        FileOutcome::Copied => summary.files_copied += 1,
                        FileOutcome::Duplicate => summary.duplicates_skipped += 1,
                    }
                    if dated {
                        summary.files_dated += 1;
                    } else {
                        summary.files_unclassified += 1;
                    }
                }
                Err(e) => {
                    error!("處理檔案失敗 {}: {e:#}", source.display());
                    summary.errors += 1;
                    complete = false;
                }
            }
        }

        if complete {
            SubfolderOutcome::Complete
        } else {
            SubfolderOutcome::Incomplete
        }
    }

    fn prepare(&self, path: &Path, relative_dir: &Path) -> PreparedFile {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();

        let kind = self.media_type_table.classify(path);
        let capture_date = self.date_extractor.extract(path, kind);
        let destination = self
            .target_resolver
            .resolve(capture_date.as_ref(), relative_dir);

        let digest = if self.shutdown_signal.load(Ordering::SeqCst) {
            Err(anyhow!("已中斷"))
        } else {
            calculate_file_hash(path)
        };

        PreparedFile {
            source: path.to_path_buf(),
            file_name,
            destination,
            digest,
        }
    }

    fn commit(&self, file: PreparedFile, namer: &mut DuplicateAwareNamer) -> Result<FileOutcome> {
        let digest = file.digest?;
        let folder = file.destination.path();

        match namer.resolve_name(folder, &file.file_name, &digest)? {
            NameResolution::Duplicate(existing) => {
                debug!(
                    "略過重複檔案: {} (已存在 {})",
                    file.source.display(),
                    existing.display()
                );
                Ok(FileOutcome::Duplicate)
            }
            NameResolution::Available(name) => {
                let target = folder.join(name);
                copy_preserving_mtime(&file.source, &target)?;
                namer.record(target.clone(), digest);
                debug!("已複製 {} -> {}", file.source.display(), target.display());
                Ok(FileOutcome::Copied)
            }
        }
    }

    fn create_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress_bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::media_organizer::resume_checkpoint::MemoryCheckpointStore;
    use crate::config::Config;
    use crate::tools::{CaptureTimeReader, DateProbe};
    use std::fs;
    use tempfile::TempDir;

    /// 檔案內容以 "DATE:YYYY-MM" 開頭時視為有拍攝日期
    struct ContentDateReader;

    impl CaptureTimeReader for ContentDateReader {
        fn read_capture_time(&self, path: &Path) -> DateProbe {
            let Ok(content) = fs::read_to_string(path) else {
                return DateProbe::Errored("unreadable".to_string());
            };
            let Some(rest) = content.strip_prefix("DATE:") else {
                return DateProbe::Absent;
            };
            let stamp = format!("{}-01 00:00:00", &rest[..7]);
            chrono::NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
                .map_or(DateProbe::Absent, |dt| DateProbe::Present(dt.into()))
        }
    }

    fn organizer(source: &Path, dest: &Path, shutdown: Arc<AtomicBool>) -> Organizer {
        Organizer::new(
            source,
            dest,
            Config::load_embedded_media_type_table().unwrap(),
            DateExtractor::new(Box::new(ContentDateReader), Box::new(ContentDateReader)),
            shutdown,
        )
    }

    #[test]
    fn test_state_initial() {
        assert_eq!(OrganizerState::initial(None), OrganizerState::Processing);
        assert_eq!(
            OrganizerState::initial(Some(String::new())),
            OrganizerState::Processing
        );
        assert_eq!(
            OrganizerState::initial(Some("2023".to_string())),
            OrganizerState::Scanning {
                resume_after: "2023".to_string()
            }
        );
    }

    #[test]
    fn test_state_visit_resumes_after_match() {
        let mut state = OrganizerState::initial(Some("2023/trip".to_string()));
        assert!(!state.visit("."));
        assert!(!state.visit("2023"));
        assert!(!state.visit("2023/trip"));
        assert_eq!(state, OrganizerState::Processing);
        assert!(state.visit("misc"));
        // 之後再遇到同名也不會回到略過狀態
        assert!(state.visit("2023/trip"));
    }

    #[test]
    fn test_state_done_processes_nothing() {
        let mut state = OrganizerState::Done;
        assert!(!state.visit("anything"));
    }

    #[test]
    fn test_run_copies_and_checkpoints_each_subfolder() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("2023/trip")).unwrap();
        fs::create_dir_all(source.path().join("misc")).unwrap();
        fs::write(source.path().join("2023/trip/a.jpg"), "DATE:2023-06 a").unwrap();
        fs::write(source.path().join("misc/b.png"), "no date").unwrap();
        fs::write(source.path().join("misc/notes.txt"), "DATE:2020-01 ignored").unwrap();

        let mut store = MemoryCheckpointStore::new();
        let summary = organizer(source.path(), dest.path(), Arc::new(AtomicBool::new(false)))
            .run(&mut store)
            .unwrap();

        assert!(dest.path().join("202306/a.jpg").exists());
        assert!(dest.path().join("SKIPPED/misc/b.png").exists());
        // 非媒體檔不讀日期
        assert!(dest.path().join("SKIPPED/misc/notes.txt").exists());
        assert_eq!(summary.files_copied, 3);
        assert_eq!(summary.files_dated, 1);
        assert_eq!(summary.files_unclassified, 2);
        assert_eq!(store.history(), [".", "2023", "2023/trip", "misc"]);
    }

    #[test]
    fn test_missing_resume_point_processes_everything() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("misc")).unwrap();
        fs::write(source.path().join("misc/b.png"), "no date").unwrap();

        let mut store = MemoryCheckpointStore::with_value("deleted/folder");
        let summary = organizer(source.path(), dest.path(), Arc::new(AtomicBool::new(false)))
            .run(&mut store)
            .unwrap();

        assert!(summary.resume_point_missing);
        assert_eq!(summary.subfolders_skipped, 0);
        assert!(dest.path().join("SKIPPED/misc/b.png").exists());
    }

    #[test]
    fn test_checkpoint_write_failure_is_fatal() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("a")).unwrap();
        fs::create_dir_all(source.path().join("b")).unwrap();
        fs::write(source.path().join("a/1.jpg"), "one").unwrap();
        fs::write(source.path().join("b/2.jpg"), "two").unwrap();

        let mut store = MemoryCheckpointStore::failing();
        let result = organizer(source.path(), dest.path(), Arc::new(AtomicBool::new(false)))
            .run(&mut store);

        assert!(result.is_err());
        // 第一個資料夾（根目錄）完成後即中止
        assert!(!dest.path().join("SKIPPED/a/1.jpg").exists());
    }

    #[test]
    fn test_interrupted_run_does_not_checkpoint() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), "DATE:2023-06").unwrap();

        let mut store = MemoryCheckpointStore::new();
        let summary = organizer(source.path(), dest.path(), Arc::new(AtomicBool::new(true)))
            .run(&mut store)
            .unwrap();

        assert!(summary.interrupted);
        assert!(store.history().is_empty());
        assert_eq!(summary.files_copied, 0);
    }

    #[test]
    fn test_destination_inside_source_is_not_walked() {
        let source = TempDir::new().unwrap();
        let dest = source.path().join("organized");
        fs::write(source.path().join("a.jpg"), "DATE:2023-06").unwrap();

        let mut store = MemoryCheckpointStore::new();
        organizer(source.path(), &dest, Arc::new(AtomicBool::new(false)))
            .run(&mut store)
            .unwrap();
        let second = organizer(source.path(), &dest, Arc::new(AtomicBool::new(false)))
            .run(&mut MemoryCheckpointStore::new())
            .unwrap();

        assert_eq!(second.files_copied, 0);
        assert_eq!(second.duplicates_skipped, 1);
        assert!(!dest.join("SKIPPED/organized").exists());
    }
}
