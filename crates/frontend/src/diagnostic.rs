#![forbid(unsafe_code)]

//! Renders compile errors against the expression source:
//!
//! ```text
//! ERROR: <input>:1:14: found no matching overload for '_>_' applied to '(string, int)'
//!  | subject.name > 0
//!  | .............^
//! ```

/// 1-based line and character column of a byte offset. Offsets past the end
/// clamp to the end of the source.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = floor_char_boundary(source, offset);
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let col = source[line_start..offset].chars().count() + 1;
    (line, col)
}

pub fn render(source: &str, offset: usize, message: &str) -> String {
    let (line, col) = line_col(source, offset);
    let text = source.lines().nth(line - 1).unwrap_or("");
    format!(
        "ERROR: <input>:{line}:{col}: {message}\n | {text}\n | {}^",
        ".".repeat(col - 1)
    )
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let rendered = render("subject.name > 0", 13, "boom");
        assert_eq!(
            rendered,
            "ERROR: <input>:1:14: boom\n | subject.name > 0\n | .............^"
        );
    }

    #[test]
    fn multi_line_uses_offending_line() {
        let src = "subject.name == \"x\" &&\n  subject.id > 1";
        let offset = src.find('>').expect("operator present");
        assert_eq!(line_col(src, offset), (2, 14));
        let rendered = render(src, offset, "bad");
        assert!(rendered.ends_with(" |   subject.id > 1\n | .............^"));
    }

    #[test]
    fn offset_at_end_of_input() {
        assert_eq!(line_col("a ==", 4), (1, 5));
        assert_eq!(line_col("a ==", 40), (1, 5));
    }

    #[test]
    fn columns_count_characters() {
        assert_eq!(line_col("\"é\" > 1", 5), (1, 5));
    }
}
