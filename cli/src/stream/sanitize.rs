//! Blank-line trimming for captured blocks.

/// Joins the buffered lines of a block into file content.
///
/// Leading and trailing whitespace-only lines are dropped. Whatever remains is
/// joined with `\n` and terminated by exactly one `\n`. A block with no
/// remaining lines yields an empty string (a valid zero-byte file).
pub fn sanitize_content(lines: &[String]) -> String {
    let has_text = |line: &String| !line.trim().is_empty();
    let Some(first) = lines.iter().position(has_text) else {
        return String::new();
    };
    // `first` exists, so a last non-blank line does too.
    let last = lines.iter().rposition(has_text).unwrap_or(first);

    let mut content = lines[first..=last].join("\n");
    content.push('\n');
    content
}
