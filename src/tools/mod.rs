mod capture_time;
mod exif_reader;
mod ffprobe_info;
mod file_copier;
mod file_hasher;
mod path_validator;
mod subfolder_scanner;

pub use capture_time::{CaptureDate, CaptureTimeReader, DateProbe};
pub use exif_reader::ExifCaptureReader;
pub use ffprobe_info::FfprobeCreationReader;
pub use file_copier::copy_preserving_mtime;
pub use file_hasher::{ContentDigest, calculate_file_hash};
pub use path_validator::{ensure_directory_exists, relative_key, validate_directory_exists};
pub use subfolder_scanner::{Subfolder, list_files, scan_subfolders};
