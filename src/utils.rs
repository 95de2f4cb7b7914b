use std::fs;
use std::path::Path;

/// Terminal (OSC8) hyperlink to a local file, labelled with `text`
pub fn file_link(path: &Path, text: &str) -> String {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!(
        "\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\",
        target.display(),
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_keeps_given_path() {
        let link = file_link(Path::new("no/such/chart.svg"), "chart");
        assert_eq!(link, "\x1b]8;;file://no/such/chart.svg\x1b\\chart\x1b]8;;\x1b\\");
    }
}
