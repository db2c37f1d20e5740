//! Token kinds produced by the scanner

use std::fmt;
use std::ops::Range;

/// Byte range in the source buffer
pub type Span = Range<usize>;

/// Classification of a scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier that is not the first token of its logical line
    Name,
    /// Identifier opening a logical line at bracket depth zero; may be a workflow keyword
    KeywordCandidate,
    /// Numeric literal
    Number,
    /// String literal, see [`StringStyle`]
    String,
    /// `# ...` up to the end of the physical line
    Comment,
    /// Operators and punctuation, including brackets
    Op,
    /// End of a logical line
    Newline,
    /// Indentation increased
    Indent,
    /// Indentation decreased
    Dedent,
    /// End of input
    End,
}

impl TokenKind {
    /// Tokens that carry no code: layout markers and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Comment | TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        )
    }

    /// Identifier-like tokens
    pub fn is_name(self) -> bool {
        matches!(self, TokenKind::Name | TokenKind::KeywordCandidate)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Name => "NAME",
            TokenKind::KeywordCandidate => "KEYWORD-CANDIDATE",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Comment => "COMMENT",
            TokenKind::Op => "OP",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::End => "END",
        };
        f.write_str(name)
    }
}

/// Delimiter style of a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringStyle {
    /// `'` or `"`
    pub quote: char,
    /// Triple-delimited (`'''` / `"""`)
    pub triple: bool,
    pub raw: bool,
    pub formatted: bool,
    pub bytes: bool,
    /// Length in bytes of the prefix letters (`rb`, `f`, ...)
    pub prefix_len: usize,
}

impl StringStyle {
    /// The delimiter as it appears in source (`"`, `'''`, ...)
    pub fn delimiter(&self) -> String {
        if self.triple {
            self.quote.to_string().repeat(3)
        } else {
            self.quote.to_string()
        }
    }
}

/// A token with its kind, text and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character
    pub line: usize,
    /// 0-based character column of the first character
    pub column: usize,
    /// 1-based line of the last character; differs from `line` for multi-line strings
    pub end_line: usize,
    pub span: Span,
    pub string_style: Option<StringStyle>,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: usize,
        column: usize,
        span: Span,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            end_line: line,
            span,
            string_style: None,
        }
    }

    /// Check for an operator with the given text
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    /// Check for an identifier with the given text
    pub fn is_name(&self, name: &str) -> bool {
        self.kind.is_name() && self.text == name
    }

    pub fn is_open_bracket(&self) -> bool {
        self.kind == TokenKind::Op && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    pub fn is_close_bracket(&self) -> bool {
        self.kind == TokenKind::Op && matches!(self.text.as_str(), ")" | "]" | "}")
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    /// Triple-quoted string spanning several physical lines
    pub fn is_multiline_string(&self) -> bool {
        self.kind == TokenKind::String && self.end_line > self.line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})@{}:{}", self.kind, self.text, self.line, self.column)
    }
}
