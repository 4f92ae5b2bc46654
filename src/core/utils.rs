use std::io;
use std::path::Path;

use tokio::fs;

/// Read one command per line from `file_path`. Blank lines and lines starting
/// with `#` are skipped.
pub async fn load_commands(file_path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(file_path).await?;
    Ok(parse_commands(&content))
}

fn parse_commands(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}
