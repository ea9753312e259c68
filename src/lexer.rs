//! Lexical analysis (tokenization) of a single command line.

use std::fmt;

/// A piece of the input line, remembering where it started.
///
/// Two tokens are equal when their texts are equal; the position only matters for diagnostics.
#[derive(Debug, Clone, Eq)]
pub struct Token {
    index: usize,
    text: String,
}

impl Token {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Char offset of the token's first character in the source line.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.text, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Whitespace,
    Word,
    DoubleQuoted,
    SingleQuoted,
    Comment,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    token_index: usize,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Whitespace,
            token_index: 0,
            buffer: String::new(),
        }
    }

    fn make_tokens(mut self) -> Vec<Token> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Whitespace => self.handle_whitespace(ch),
                LexingState::Word => self.handle_word(ch, &mut out),
                LexingState::DoubleQuoted => self.handle_quoted(ch, '"'),
                LexingState::SingleQuoted => self.handle_quoted(ch, '\''),
                LexingState::Comment => {}
            }
        }

        // Unterminated quotes are tolerated and flushed like a word.
        match self.state {
            LexingState::Word | LexingState::DoubleQuoted | LexingState::SingleQuoted => {
                self.emit(&mut out)
            }
            LexingState::Whitespace | LexingState::Comment => {}
        }

        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn emit(&mut self, out: &mut Vec<Token>) {
        out.push(Token::new(self.token_index, std::mem::take(&mut self.buffer)));
    }

    fn handle_whitespace(&mut self, ch: char) {
        if ch.is_whitespace() {
            return;
        }
        self.token_index = self.pos - 1;
        match ch {
            '"' => self.state = LexingState::DoubleQuoted,
            '\'' => self.state = LexingState::SingleQuoted,
            '#' => self.state = LexingState::Comment,
            c => {
                // Special characters are allowed to start a word as well.
                self.buffer.push(c);
                self.state = LexingState::Word;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {
                self.emit(out);
                self.state = LexingState::Whitespace;
            }
            '#' => {
                self.emit(out);
                self.state = LexingState::Comment;
            }
            '"' | '\'' => {
                if self.peek_char() == Some(ch) {
                    self.read_char();
                    self.buffer.push(ch);
                } else if ch == '"' {
                    self.state = LexingState::DoubleQuoted;
                } else {
                    self.state = LexingState::SingleQuoted;
                }
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char, quote: char) {
        if ch != quote {
            self.buffer.push(ch);
        } else if self.peek_char() == Some(quote) {
            self.read_char();
            self.buffer.push(quote);
        } else {
            // a"b"c is the same as abc
            self.state = LexingState::Word;
        }
    }
}

/// Splits a command line into tokens.
///
/// Words are separated by whitespace; `"..."` and `'...'` quote text verbatim, a doubled quote
/// character stands for itself, and `#` comments out the rest of the line. `None` yields no tokens.
pub fn tokenize<'a>(line: impl Into<Option<&'a str>>) -> Vec<Token> {
    match line.into() {
        Some(line) => LexingFSM::new(line).make_tokens(),
        None => Vec::new(),
    }
}

/// Quotes `input` so that `tokenize(escape_string(input))` yields exactly one token equal to `input`.
pub fn escape_string(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 10);
    escaped.push('"');
    for ch in input.chars() {
        if ch == '"' {
            escaped.push_str("\"\"");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_token_counts() {
        let cases = [
            ("", 0),
            ("aSingleToken", 1),
            ("a b c", 3),
            ("an's g'ri # quotation test", 1),
            ("Shell instance = new Shell(new ShellTest(), System.out", 7),
            ("dir \"E:\\ASG\\!dynamic\\projects\" \t-l 3492.9  ", 4),
            ("a b c ''", 4),
            (" \"\" ", 1),
        ];
        for (line, expected) in cases {
            assert_eq!(tokenize(line).len(), expected, "line: {line:?}");
        }
    }

    #[test]
    fn test_absent_line_has_no_tokens() {
        assert!(tokenize(None::<&str>).is_empty());
    }

    #[test]
    fn test_quotes_concatenate_with_words() {
        assert_eq!(texts("a\"b\"c"), vec!["abc"]);
        assert_eq!(texts("an's g'ri # quotation test"), vec!["ans gri"]);
    }

    #[test]
    fn test_doubled_quotes_are_literal() {
        assert_eq!(texts("say\"\"hi"), vec!["say\"hi"]);
        assert_eq!(texts("\"a \"\"quoted\"\" word\""), vec!["a \"quoted\" word"]);
        assert_eq!(texts("it''s"), vec!["it's"]);
    }

    #[test]
    fn test_comment_closes_word() {
        assert_eq!(texts("abc#def ghi"), vec!["abc"]);
        assert_eq!(texts("# only a comment"), Vec::<String>::new());
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        assert_eq!(texts("echo \"open ended"), vec!["echo", "open ended"]);
    }

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("  add 12 \"x y\"");
        let indexes: Vec<usize> = tokens.iter().map(Token::index).collect();
        assert_eq!(indexes, vec![2, 6, 9]);
        assert_eq!(tokens[2].to_string(), "x y:9");
    }

    #[test]
    fn test_equality_ignores_position() {
        assert_eq!(Token::new(0, "a"), Token::new(7, "a"));
        assert_ne!(Token::new(0, "a"), Token::new(0, "b"));
    }

    #[test]
    fn test_escape_string_round_trip() {
        let cases = [
            "",
            "aSingleToken",
            "a b c",
            "an's g'ri # quotation test",
            "Shell instance = new Shell(new ShellTest(), System.out",
            "dir \"E:\\ASG\\!dynamic\\projects\" \t-l 3492.9  ",
            "\"\"",
            "trailing\"",
        ];
        for case in cases {
            let tokens = tokenize(escape_string(case).as_str());
            assert_eq!(tokens.len(), 1, "case: {case:?}");
            assert_eq!(tokens[0].text(), case);
        }
    }
}
