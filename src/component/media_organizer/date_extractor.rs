use crate::config::MediaKind;
use crate::tools::{
    CaptureDate, CaptureTimeReader, DateProbe, ExifCaptureReader, FfprobeCreationReader,
};
use log::{debug, warn};
use std::path::Path;

/// 依媒體類型分派到對應的拍攝時間讀取器
pub struct DateExtractor {
    photo: Box<dyn CaptureTimeReader>,
    video: Box<dyn CaptureTimeReader>,
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new(
            Box::new(ExifCaptureReader::new()),
            Box::new(FfprobeCreationReader::new()),
        )
    }
}

impl DateExtractor {
    #[must_use]
    pub fn new(photo: Box<dyn CaptureTimeReader>, video: Box<dyn CaptureTimeReader>) -> Self {
        Self { photo, video }
    }

    /// 讀取失敗一律視為沒有日期，只記錄警告，不會中斷整體流程
    #[must_use]
    pub fn extract(&self, path: &Path, kind: MediaKind) -> Option<CaptureDate> {
        let probe = match kind {
            MediaKind::Photo => self.photo.read_capture_time(path),
            MediaKind::Video => self.video.read_capture_time(path),
            MediaKind::Unrecognized => return None,
        };

        match probe {
            DateProbe::Present(date) => Some(date),
            DateProbe::Absent => {
                debug!("找不到拍攝時間: {}", path.display());
                None
            }
            DateProbe::Errored(reason) => {
                warn!("無法讀取中繼資料 {}: {reason}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedReader {
        probe: DateProbe,
        calls: Arc<AtomicUsize>,
    }

    impl CaptureTimeReader for FixedReader {
        fn read_capture_time(&self, _path: &Path) -> DateProbe {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.probe.clone()
        }
    }

    fn june_2023() -> CaptureDate {
        NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .into()
    }

    fn extractor(photo: DateProbe, video: DateProbe) -> (DateExtractor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let extractor = DateExtractor::new(
            Box::new(FixedReader {
                probe: photo,
                calls: Arc::clone(&calls),
            }),
            Box::new(FixedReader {
                probe: video,
                calls: Arc::clone(&calls),
            }),
        );
        (extractor, calls)
    }

    #[test]
    fn test_dispatch_by_kind() {
        let (extractor, _) = extractor(DateProbe::Present(june_2023()), DateProbe::Absent);
        assert_eq!(
            extractor.extract(Path::new("a.jpg"), MediaKind::Photo),
            Some(june_2023())
        );
        assert_eq!(extractor.extract(Path::new("a.mp4"), MediaKind::Video), None);
    }

    #[test]
    fn test_errored_collapses_to_absent() {
        let (extractor, _) = extractor(
            DateProbe::Errored("corrupt".to_string()),
            DateProbe::Errored("no ffprobe".to_string()),
        );
        assert_eq!(extractor.extract(Path::new("a.jpg"), MediaKind::Photo), None);
        assert_eq!(extractor.extract(Path::new("a.mov"), MediaKind::Video), None);
    }

    #[test]
    fn test_unrecognized_never_reads() {
        let (extractor, calls) = extractor(
            DateProbe::Present(june_2023()),
            DateProbe::Present(june_2023()),
        );
        assert_eq!(
            extractor.extract(Path::new("notes.txt"), MediaKind::Unrecognized),
            None
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
