use std::fs;
use std::path::Path;

use anyhow::Context;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create dir: {}", path.display()))
}

/// Write `bytes` next to `dst` and swap it in, so readers never see a half-written file.
pub fn write_replacing(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    let tmp = dst.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("failed to write temp: {}", tmp.display()))?;
    replace_file(&tmp, dst)
}

/// Replace `dst` with `tmp`. `rename` onto an existing file fails on Windows,
/// so the old file is moved aside first and restored if the swap fails.
pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}
