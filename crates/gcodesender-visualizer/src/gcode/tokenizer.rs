//! Program tokenizer
//!
//! Splits raw program text into normalized commands. A new command starts at
//! every `G` or `M` letter; line breaks on their own never end a command, so
//! `"G90 G1 Z0.25"` and `"G90\nG1 Z0.25"` tokenize identically.

/// A normalized command such as `"G1 X10 F200"`: uppercase, single-spaced,
/// free of comments. Produced once by [`tokenize`] and never mutated.
pub type Command = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Code,
    /// `;` up to and including the next newline
    LineComment,
    /// `(` up to and including the next `)`; unterminated swallows the rest
    InlineComment,
}

fn flush(buffer: &mut String, commands: &mut Vec<Command>) {
    let command = buffer.trim().to_uppercase();
    if !command.is_empty() {
        commands.push(command);
    }
    buffer.clear();
}

/// Split program text into normalized commands, in input order
///
/// Text before the first `G`/`M` is discarded. Malformed input never fails.
pub fn tokenize(text: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut buffer = String::new();
    let mut mode = ScanMode::Code;

    for c in text.chars() {
        match mode {
            ScanMode::LineComment => {
                if c == '\n' {
                    mode = ScanMode::Code;
                }
            }
            ScanMode::InlineComment => {
                if c == ')' {
                    mode = ScanMode::Code;
                }
            }
            ScanMode::Code => match c {
                ';' => mode = ScanMode::LineComment,
                '(' => mode = ScanMode::InlineComment,
                'G' | 'M' => {
                    flush(&mut buffer, &mut commands);
                    buffer.push(c);
                }
                ' ' | '\n' | '\t' | '\r' => {
                    if !buffer.is_empty() && !buffer.ends_with(' ') {
                        buffer.push(' ');
                    }
                }
                _ => {
                    // Nothing is kept until the first command letter.
                    if !buffer.is_empty() {
                        buffer.push(c);
                    }
                }
            },
        }
    }

    flush(&mut buffer, &mut commands);
    tracing::trace!("tokenized {} bytes into {} commands", text.len(), commands.len());
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_delimited() {
        let input = "G90\nG1 Z0.25 F20\nG0 X1.125 Y1.125 F10\nG1 Z-0.1 F5";
        assert_eq!(
            tokenize(input),
            vec!["G90", "G1 Z0.25 F20", "G0 X1.125 Y1.125 F10", "G1 Z-0.1 F5"]
        );
    }

    #[test]
    fn test_one_long_line() {
        let input = "G90 G1 Z0.25 F20 G0 X1.125 Y1.125 F10 G1 Z-0.1 F5";
        assert_eq!(
            tokenize(input),
            vec!["G90", "G1 Z0.25 F20", "G0 X1.125 Y1.125 F10", "G1 Z-0.1 F5"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t").is_empty());
    }

    #[test]
    fn test_leading_text_discarded() {
        assert_eq!(tokenize("%\nN10 G1 X1"), vec!["G1 X1"]);
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            tokenize("G21 ; metric\nG90 ; absolute\n"),
            vec!["G21", "G90"]
        );
        // The newline ending a comment is consumed, not copied.
        assert_eq!(tokenize("G1 X1;c\nY2"), vec!["G1 X1Y2"]);
    }

    #[test]
    fn test_inline_comment() {
        assert_eq!(
            tokenize("G1 X1 (move G0 somewhere) Y2"),
            vec!["G1 X1 Y2"]
        );
    }

    #[test]
    fn test_unterminated_inline_comment_swallows_rest() {
        assert_eq!(tokenize("G90 (oops G1 X10\nG1 Y10"), vec!["G90"]);
    }

    #[test]
    fn test_whitespace_collapsed_and_uppercased() {
        assert_eq!(tokenize("G1\t\tx10   y2\r\n"), vec!["G1 X10 Y2"]);
    }

    #[test]
    fn test_mcodes_start_commands() {
        assert_eq!(tokenize("M3 S1000 G4 P500 M5"), vec!["M3 S1000", "G4 P500", "M5"]);
    }

    #[test]
    fn test_lowercase_letters_do_not_start_commands() {
        assert!(tokenize("some text without codes").is_empty());
    }
}
