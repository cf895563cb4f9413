use std::path::{Path, PathBuf};

pub async fn read_file_lines(path: impl AsRef<Path>) -> eyre::Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_lines(&contents))
}

/// Splits on newlines, trims each line and drops the empty ones.
pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Prefers `name` next to the running executable and falls back to the working directory.
pub fn locate_beside_executable(name: &str) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    locate_in(exe_dir.as_deref(), name)
}

fn locate_in(dir: Option<&Path>, name: &str) -> PathBuf {
    dir.map(|dir| dir.join(name))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}

pub async fn read_recipients(path: impl AsRef<Path>) -> eyre::Result<Vec<String>> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await? {
        eyre::bail!("{} not found!", path.display());
    }

    read_file_lines(path).await
}
