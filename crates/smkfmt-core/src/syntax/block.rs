//! Block tree produced by the builder
//!
//! A Snakefile is a flat sequence of [`Block`]s. Keyword blocks carry a
//! [`KeywordHeader`]; structural keywords own nested children. Host-language
//! suites that contain keywords do not nest in the tree: their blocks follow the
//! header span with a larger `indent_level`.
//!
//! Blocks borrow their tokens from the scanner's token vector, so a block list
//! lives no longer than the tokens it was built from.

use super::token::Token;

/// A comment with its source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Text as written, starting at `#`
    pub text: String,
    pub line: usize,
    pub column: usize,
    /// At least one blank line separates this comment from what precedes it
    pub blank_before: bool,
}

impl Comment {
    pub fn from_token(token: &Token, blank_before: bool) -> Self {
        Self {
            text: token.text.trim_end().to_string(),
            line: token.line,
            column: token.column,
            blank_before,
        }
    }
}

/// Attributes shared by every keyword block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHeader {
    pub keyword: String,
    pub line: usize,
    pub column: usize,
    pub indent_level: usize,
    /// Standalone comments bound directly above the keyword line
    pub header_comments: Vec<Comment>,
    /// Comment on the keyword line itself
    pub trailing_comment: Option<Comment>,
}

/// One item of a list keyword body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter<'t> {
    /// Set for `name=value` items
    pub name: Option<String>,
    /// Value tokens; comments inside brackets are kept in place
    pub value: Vec<&'t Token>,
    pub trailing_comment: Option<Comment>,
    pub leading_comments: Vec<Comment>,
    /// Positional items are emitted before named and `**` items
    pub is_positional: bool,
}

/// One logical line of an expression keyword body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'t> {
    pub tokens: Vec<&'t Token>,
    pub trailing_comment: Option<Comment>,
    pub leading_comments: Vec<Comment>,
}

/// A contiguous host-language span, already dedented to column zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericCode {
    pub code: String,
    pub line: usize,
    pub column: usize,
    pub indent_level: usize,
    /// The last line is a compound statement header whose suite was parsed separately
    pub opens_suite: bool,
    /// The first line continues a compound statement (`else`, `elif`, `except`, `finally`)
    pub continues_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineKeyword<'t> {
    pub header: KeywordHeader,
    pub value: Vec<&'t Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListKeyword<'t> {
    pub header: KeywordHeader,
    pub params: Vec<Parameter<'t>>,
    /// Comments after the last parameter
    pub dangling_comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionKeyword<'t> {
    pub header: KeywordHeader,
    pub chunks: Vec<Chunk<'t>>,
    pub dangling_comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralKeyword<'t> {
    pub header: KeywordHeader,
    pub name: Option<&'t Token>,
    pub children: Vec<Block<'t>>,
}

/// Keyword whose suite is host-language code, such as `run:` or `onstart:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBody {
    pub header: KeywordHeader,
    pub body: GenericCode,
}

/// String literal opening a structural body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docstring<'t> {
    pub tokens: Vec<&'t Token>,
    pub indent_level: usize,
    pub trailing_comment: Option<Comment>,
}

/// Run of standalone comments not bound to any block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub comments: Vec<Comment>,
    pub indent_level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'t> {
    GenericCode(GenericCode),
    InlineKeyword(InlineKeyword<'t>),
    ListKeyword(ListKeyword<'t>),
    ExpressionKeyword(ExpressionKeyword<'t>),
    StructuralKeyword(StructuralKeyword<'t>),
    BlockBody(BlockBody),
    Docstring(Docstring<'t>),
    Comments(CommentBlock),
}

impl Block<'_> {
    pub fn header(&self) -> Option<&KeywordHeader> {
        match self {
            Block::InlineKeyword(b) => Some(&b.header),
            Block::ListKeyword(b) => Some(&b.header),
            Block::ExpressionKeyword(b) => Some(&b.header),
            Block::StructuralKeyword(b) => Some(&b.header),
            Block::BlockBody(b) => Some(&b.header),
            Block::GenericCode(_) | Block::Docstring(_) | Block::Comments(_) => None,
        }
    }

    pub fn indent_level(&self) -> usize {
        match self {
            Block::GenericCode(b) => b.indent_level,
            Block::Docstring(b) => b.indent_level,
            Block::Comments(b) => b.indent_level,
            _ => self.header().map_or(0, |h| h.indent_level),
        }
    }

    pub fn header_comments(&self) -> &[Comment] {
        self.header().map_or(&[], |h| h.header_comments.as_slice())
    }

    /// Total number of blocks in this subtree
    pub fn count(&self) -> usize {
        match self {
            Block::StructuralKeyword(b) => 1 + b.children.iter().map(Block::count).sum::<usize>(),
            _ => 1,
        }
    }
}
