use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// 檔案內容的 BLAKE3 摘要（32 bytes），附帶讀到的位元組數
///
/// 長度可用來先以檔案大小篩選，只有大小相同時才需要計算摘要比對
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    hash: blake3::Hash,
    len: u64,
}

impl ContentDigest {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.hash.as_bytes()
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash.to_hex())
    }
}

/// 以固定大小區塊串流讀取檔案並計算摘要，不會把整個檔案載入記憶體
pub fn calculate_file_hash(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path).with_context(|| format!("無法開啟檔案: {}", path.display()))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut len: u64 = 0;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("讀取檔案失敗: {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        len += bytes_read as u64;
    }

    Ok(ContentDigest {
        hash: hasher.finalize(),
        len,
    })
}
