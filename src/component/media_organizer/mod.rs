//! 依拍攝日期整理媒體檔案元件
//!
//! 讀取照片 EXIF 或影片容器的建立時間，複製到 `YYYYMM` 資料夾；
//! 無法取得日期的檔案依來源結構放到 `SKIPPED/`。
//! 以 BLAKE3 摘要避免同一資料夾內出現重複內容，並以檢查點支援中斷後續跑。

mod date_extractor;
mod duplicate_namer;
mod error;
mod main;
mod organizer;
mod resume_checkpoint;
mod target_resolver;

pub use date_extractor::DateExtractor;
pub use duplicate_namer::{DuplicateAwareNamer, MAX_NAME_SUFFIX, NameResolution};
pub use error::OrganizeError;
pub use main::MediaOrganizer;
pub use organizer::{OrganizeSummary, Organizer, OrganizerState};
pub use resume_checkpoint::{
    CHECKPOINT_FILE, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
};
pub use target_resolver::{Destination, SKIPPED_FOLDER, TargetResolver};
