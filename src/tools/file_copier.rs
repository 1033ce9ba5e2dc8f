use anyhow::{Context, Result};
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 複製檔案並保留修改時間，目標資料夾不存在時自動建立
///
/// 先寫入同資料夾下的暫存檔再 rename，失敗時不會在目標位置留下不完整的檔案
pub fn copy_preserving_mtime(source: &Path, target: &Path) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| anyhow::anyhow!("無效的目標路徑: {}", target.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("無法建立目錄: {}", parent.display()))?;

    let partial = partial_path(target);
    if let Err(e) = copy_into(source, &partial).and_then(|()| {
        fs::rename(&partial, target).with_context(|| {
            format!("無法重新命名: {} -> {}", partial.display(), target.display())
        })
    }) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    Ok(())
}

fn copy_into(source: &Path, partial: &Path) -> Result<()> {
    fs::copy(source, partial)
        .with_context(|| format!("複製檔案失敗: {} -> {}", source.display(), partial.display()))?;

    let metadata =
        fs::metadata(source).with_context(|| format!("無法讀取檔案資訊: {}", source.display()))?;
    let mut times = FileTimes::new().set_modified(
        metadata
            .modified()
            .with_context(|| format!("無法取得修改時間: {}", source.display()))?,
    );
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    // fs::copy 會一併複製權限，唯讀來源需先暫時開放寫入
    let permissions = metadata.permissions();
    if permissions.readonly() {
        fs::set_permissions(partial, writable(permissions.clone()))
            .with_context(|| format!("無法設定檔案權限: {}", partial.display()))?;
    }

    let file = fs::File::options()
        .write(true)
        .open(partial)
        .with_context(|| format!("無法開啟檔案: {}", partial.display()))?;
    file.set_times(times)
        .with_context(|| format!("無法設定檔案時間: {}", partial.display()))?;
    drop(file);

    if permissions.readonly() {
        fs::set_permissions(partial, permissions)
            .with_context(|| format!("無法設定檔案權限: {}", partial.display()))?;
    }
    Ok(())
}

fn writable(mut permissions: fs::Permissions) -> fs::Permissions {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    permissions.set_readonly(false);
    permissions
}

fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.partial", Uuid::new_v4().simple()))
}
