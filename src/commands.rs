//! Line commands read from stdin.

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Visit(&'a str),
    Run(&'a str),
    Status,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    /// Parse one input line. `run` takes the rest of the line verbatim; see
    /// [`expand_newlines`] for how line breaks are written.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let trimmed = line.trim_start();
        let (word, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        match word {
            "" => Self::Empty,
            "visit" if !rest.trim().is_empty() => Self::Visit(rest.trim()),
            "run" => Self::Run(rest),
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(trimmed),
        }
    }
}

/// Expand `\n` escapes in a `run` payload typed on one line.
///
/// Inside a string literal the escape is left for the script language, so
/// `print('a\nb')` keeps its embedded newline. In a comment it ends the
/// comment.
pub fn expand_newlines(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = payload.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            match quote {
                Some(q) if c == q => quote = None,
                None if !in_comment && (c == '\'' || c == '"') => quote = Some(c),
                None if c == '#' => in_comment = true,
                _ => {}
            }
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') if quote.is_none() => {
                out.push('\n');
                in_comment = false;
            }
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("visit https://google.com\n"), Command::Visit("https://google.com"));
        assert_eq!(Command::parse("run x = 1 + 1"), Command::Run("x = 1 + 1"));
        assert_eq!(Command::parse("run init"), Command::Run("init"));
        assert_eq!(Command::parse("  status  "), Command::Status);
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(Command::parse("visit"), Command::Unknown("visit"));
        assert_eq!(Command::parse("jump now"), Command::Unknown("jump now"));
    }

    #[test]
    fn test_expand_newlines() {
        assert_eq!(expand_newlines("x = 1\\nassert x == 1"), "x = 1\nassert x == 1");
        assert_eq!(expand_newlines(r"# setup\nx = 1"), "# setup\nx = 1");
        assert_eq!(expand_newlines(r"# it's\nx = 1"), "# it's\nx = 1");
    }

    #[test]
    fn test_expand_newlines_leaves_string_escapes() {
        assert_eq!(expand_newlines(r"print('a\nb')"), r"print('a\nb')");
        assert_eq!(
            expand_newlines(r#"s = "x\"y\n"\nassert len(s) == 4"#),
            "s = \"x\\\"y\\n\"\nassert len(s) == 4"
        );
        assert_eq!(expand_newlines(r"s = 'it\'s'\nx = 1"), "s = 'it\\'s'\nx = 1");
        assert_eq!(expand_newlines("trailing\\"), "trailing\\");
    }
}
