use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::path::{Component, Path};

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立目錄: {}", path.display()))?;
    }
    Ok(())
}

/// 將相對路徑轉成與平台無關的字串（以 `/` 分隔），根目錄為 "."
///
/// `%` 與不是合法 UTF-8 的位元組會寫成 `%XX`，不同的資料夾一定得到不同的字串
#[must_use]
pub fn relative_key(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(escape_component(part)),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn escape_component(part: &OsStr) -> String {
    let mut escaped = String::new();
    for chunk in part.as_encoded_bytes().utf8_chunks() {
        for ch in chunk.valid().chars() {
            if ch == '%' {
                escaped.push_str("%25");
            } else {
                escaped.push(ch);
            }
        }
        for byte in chunk.invalid() {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_key() {
        assert_eq!(relative_key(Path::new("")), ".");
        assert_eq!(relative_key(Path::new(".")), ".");
        assert_eq!(relative_key(Path::new("2023/trip")), "2023/trip");
        assert_eq!(relative_key(&Path::new("2023").join("trip")), "2023/trip");
        assert_eq!(relative_key(Path::new("照片/旅行")), "照片/旅行");
    }

    #[test]
    fn test_relative_key_escapes_percent() {
        assert_eq!(relative_key(Path::new("100%/a%FF")), "100%25/a%25FF");
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_key_keeps_non_utf8_names_apart() {
        use std::os::unix::ffi::OsStrExt;

        let ff = relative_key(Path::new(OsStr::from_bytes(b"a\xff")));
        let fe = relative_key(Path::new(OsStr::from_bytes(b"a\xfe/b")));
        assert_eq!(ff, "a%FF");
        assert_eq!(fe, "a%FE/b");
        assert_ne!(ff, relative_key(Path::new("a%FF")));
    }

    #[test]
    fn test_validate_directory_exists() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_directory_exists(temp_dir.path()).is_ok());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(validate_directory_exists(&file).is_err());
        assert!(validate_directory_exists(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_ensure_directory_exists() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b/c");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory_exists(&nested).unwrap();
    }
}
