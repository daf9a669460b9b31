//! SQL statement splitter.
//!
//! Splits a script into statements on `;` in a single left-to-right pass.
//! Semicolons inside quoted literals, quoted identifiers, line comments,
//! block comments and dollar-quoted bodies do not end a statement.
//!
//! The scanner never rejects input. Unterminated quotes or comments simply
//! run to the end of the script and are emitted as part of the last
//! statement. Backslash escapes are not recognized: `'it\'s'` closes the
//! literal at the second quote.

use crate::core::source::{CharSource, Lookahead, ReaderSource, LOOKAHEAD_WINDOW};
use crate::Result;
use std::io::BufRead;

/// Lexical context at the current scan position.
///
/// Exactly one state is active. Whichever construct opens first owns the
/// scan until its own closing delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexState {
    #[default]
    Normal,
    /// Inside `-- ...` up to and including the newline.
    LineComment,
    /// Inside `/* ... */`.
    BlockComment,
    /// Inside `'...'`.
    SingleQuoted,
    /// Inside `"..."`.
    DoubleQuoted,
    /// Inside a dollar-quoted body. Holds the opening tag, e.g. `$$` or `$body$`.
    DollarQuoted(String),
}

impl LexState {
    /// True when a `;` at this position would not end the statement.
    pub fn is_suspended(&self) -> bool {
        !matches!(self, LexState::Normal)
    }
}

/// Collects characters for the current statement and emits finished ones.
#[derive(Debug, Default)]
struct Accumulator {
    buffer: String,
    statements: Vec<String>,
}

impl Accumulator {
    fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    fn extend(&mut self, chars: &[char]) {
        self.buffer.extend(chars);
    }

    fn flush(&mut self) {
        let statement = self.buffer.trim();
        if !statement.is_empty() {
            self.statements.push(statement.to_string());
        }
        self.buffer.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.statements
    }
}

/// Single-use scanner over a character source.
pub struct Splitter<S> {
    input: Lookahead<S>,
    state: LexState,
    acc: Accumulator,
}

impl<S: CharSource> Splitter<S> {
    pub fn new(source: S) -> Self {
        Self {
            input: Lookahead::new(source),
            state: LexState::Normal,
            acc: Accumulator::default(),
        }
    }

    /// Scan the whole input and return the statements in textual order.
    pub fn run(mut self) -> std::result::Result<Vec<String>, S::Error> {
        while let Some(c) = self.input.next()? {
            self.step(c)?;
        }
        if self.state.is_suspended() {
            tracing::debug!("Script ended inside {:?}", self.state);
        }
        Ok(self.acc.finish())
    }

    fn step(&mut self, c: char) -> std::result::Result<(), S::Error> {
        match &self.state {
            LexState::Normal => self.step_normal(c)?,
            LexState::LineComment => {
                self.acc.push(c);
                if c == '\n' {
                    self.state = LexState::Normal;
                }
            }
            LexState::BlockComment => {
                self.acc.push(c);
                if c == '*' && self.input.next_is('/')? {
                    let closing = self.input.bump(1)?;
                    self.acc.extend(&closing);
                    self.state = LexState::Normal;
                }
            }
            LexState::SingleQuoted => {
                self.acc.push(c);
                if c == '\'' {
                    self.state = LexState::Normal;
                }
            }
            LexState::DoubleQuoted => {
                self.acc.push(c);
                if c == '"' {
                    self.state = LexState::Normal;
                }
            }
            LexState::DollarQuoted(tag) => {
                self.acc.push(c);
                if c == '$' {
                    // Everything after the opening `$`, including the closing `$`.
                    let rest: Vec<char> = tag.chars().skip(1).collect();
                    if self.input.peek(rest.len())? == rest.as_slice() {
                        let closing = self.input.bump(rest.len())?;
                        self.acc.extend(&closing);
                        self.state = LexState::Normal;
                    }
                }
            }
        }
        Ok(())
    }

    fn step_normal(&mut self, c: char) -> std::result::Result<(), S::Error> {
        match c {
            '-' if self.input.next_is('-')? => {
                self.acc.push(c);
                let marker = self.input.bump(1)?;
                self.acc.extend(&marker);
                self.state = LexState::LineComment;
            }
            '/' if self.input.next_is('*')? => {
                self.acc.push(c);
                let marker = self.input.bump(1)?;
                self.acc.extend(&marker);
                self.state = LexState::BlockComment;
            }
            '$' => match self.detect_dollar_tag()? {
                Some(tag) => {
                    let len = tag.chars().count();
                    self.acc.push(c);
                    let opening = self.input.bump(len - 1)?;
                    self.acc.extend(&opening);
                    self.state = LexState::DollarQuoted(tag);
                }
                None => self.acc.push(c),
            },
            '\'' => {
                self.acc.push(c);
                self.state = LexState::SingleQuoted;
            }
            '"' => {
                self.acc.push(c);
                self.state = LexState::DoubleQuoted;
            }
            ';' => self.acc.flush(),
            _ => self.acc.push(c),
        }
        Ok(())
    }

    /// Look for the second `$` of a dollar-quote tag after a `$` was read.
    ///
    /// Returns the full tag (both dollar signs included) without consuming
    /// anything. Whitespace before the closing `$`, or running out of
    /// lookahead, means the `$` is an ordinary character.
    fn detect_dollar_tag(&mut self) -> std::result::Result<Option<String>, S::Error> {
        let mut tag = String::from('$');
        for &c in self.input.peek(LOOKAHEAD_WINDOW)? {
            tag.push(c);
            match c {
                '$' => return Ok(Some(tag)),
                ' ' | '\t' | '\n' => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Split an in-memory script into trimmed, non-empty statements.
pub fn split(script: &str) -> Vec<String> {
    match Splitter::new(script.chars()).run() {
        Ok(statements) => statements,
        Err(never) => match never {},
    }
}

/// Split statements from any character source.
pub fn split_source<S: CharSource>(source: S) -> std::result::Result<Vec<String>, S::Error> {
    Splitter::new(source).run()
}

/// Split a UTF-8 script read from `reader`.
///
/// A read fault or invalid UTF-8 aborts with [`crate::Error::ScriptRead`].
pub fn split_reader<R: BufRead>(reader: R) -> Result<Vec<String>> {
    split_source(ReaderSource::new(reader)).map_err(crate::Error::ScriptRead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_statements() {
        assert_eq!(
            split("select 1; select 2 ;\n  select 3"),
            vec!["select 1", "select 2", "select 3"]
        );
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert_eq!(split(";;  ;\n select 1;;\n\t;"), vec!["select 1"]);
        assert!(split("   \n\t ").is_empty());
        assert!(split("").is_empty());
    }

    #[test]
    fn test_doubled_quote_stays_in_literal() {
        assert_eq!(
            split("select 'it''s; fine'; select 2"),
            vec!["select 'it''s; fine'", "select 2"]
        );
    }

    #[test]
    fn test_backslash_does_not_escape_quote() {
        // The second quote closes the literal, so the `;` after it splits.
        assert_eq!(
            split(r"select 'a\'; select 'b'"),
            vec![r"select 'a\'", "select 'b'"]
        );
    }

    #[test]
    fn test_double_quote_inside_single_is_literal() {
        assert_eq!(
            split(r#"select 'say "hi;"' ; select "col;name" from t"#),
            vec![r#"select 'say "hi;"'"#, r#"select "col;name" from t"#]
        );
    }

    #[test]
    fn test_dollar_quote_with_tag() {
        let script = "create function f() returns int as $body$\nbegin\n  return 1;\nend;\n$body$ language plpgsql;\nselect f();";
        let statements = split(script);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].ends_with("$body$ language plpgsql"));
        assert_eq!(statements[1], "select f()");
    }

    #[test]
    fn test_dollar_quote_requires_matching_tag() {
        let script = "do $a$ select '$b$'; $$ ; $a$; select 2";
        assert_eq!(
            split(script),
            vec!["do $a$ select '$b$'; $$ ; $a$", "select 2"]
        );
    }

    #[test]
    fn test_empty_dollar_tag() {
        assert_eq!(
            split("do $$ begin perform 1; end $$; select 1"),
            vec!["do $$ begin perform 1; end $$", "select 1"]
        );
    }

    #[test]
    fn test_dollar_followed_by_whitespace_is_literal() {
        assert_eq!(
            split("select $1, $2 from t; select 3"),
            vec!["select $1, $2 from t", "select 3"]
        );
    }

    #[test]
    fn test_dollar_without_closing_within_window_is_literal() {
        let long = "x".repeat(LOOKAHEAD_WINDOW + 10);
        let script = format!("select ${long}$; select 2");
        // No second `$` inside the window, so the first `$` is literal and
        // the trailing `$` opens nothing that can close before `;`.
        assert_eq!(
            split(&script),
            vec![format!("select ${long}$"), "select 2".to_string()]
        );
    }

    #[test]
    fn test_longest_tag_that_fits_window_opens_quote() {
        // Body plus closing `$` fill the window exactly.
        let tag = format!("${}$", "x".repeat(LOOKAHEAD_WINDOW - 1));
        let script = format!("select {tag} a; b {tag}; select 2");
        assert_eq!(
            split(&script),
            vec![format!("select {tag} a; b {tag}"), "select 2".to_string()]
        );
    }

    #[test]
    fn test_tag_one_past_window_is_literal() {
        let tag = format!("${}$", "x".repeat(LOOKAHEAD_WINDOW));
        let script = format!("select {tag} a; b {tag}; select 2");
        assert_eq!(
            split(&script),
            vec![
                format!("select {tag} a"),
                format!("b {tag}"),
                "select 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_quote_inside_comment_is_ignored() {
        assert_eq!(
            split("select 1 -- don't stop\n; select 2"),
            vec!["select 1 -- don't stop", "select 2"]
        );
    }

    #[test]
    fn test_comment_markers_inside_literal() {
        assert_eq!(
            split("select '--', '/*'; select 2"),
            vec!["select '--', '/*'", "select 2"]
        );
    }

    #[test]
    fn test_single_dash_and_slash_are_plain() {
        assert_eq!(
            split("select 4 - 1 / 3; select 2"),
            vec!["select 4 - 1 / 3", "select 2"]
        );
    }

    #[test]
    fn test_block_comment_close_needs_adjacent_slash() {
        assert_eq!(
            split("/* a * / b ; */ select 1; select 2"),
            vec!["/* a * / b ; */ select 1", "select 2"]
        );
    }

    #[test]
    fn test_unterminated_constructs_are_flushed() {
        assert_eq!(split("select 1; 'open;"), vec!["select 1", "'open;"]);
        assert_eq!(split("select 1; $x$ body;"), vec!["select 1", "$x$ body;"]);
        assert_eq!(split("select 1; -- tail; "), vec!["select 1", "-- tail;"]);
    }

    #[test]
    fn test_is_suspended() {
        assert!(!LexState::Normal.is_suspended());
        assert!(LexState::LineComment.is_suspended());
        assert!(LexState::DollarQuoted("$$".to_string()).is_suspended());
    }
}
