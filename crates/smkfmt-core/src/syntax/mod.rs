//! Scanning and block tree construction
//!
//! ```text
//! source ──lexer──▶ tokens ──parser──▶ blocks
//!                              │
//!                   keywords / params / trivia
//! ```
//!
//! Blocks borrow from the token vector, so callers keep the tokens alive for
//! as long as they use the blocks.

pub mod block;
pub mod keywords;
pub mod lexer;
pub mod params;
pub mod parser;
pub mod token;
pub mod trivia;

pub use block::{
    Block, BlockBody, Chunk, Comment, CommentBlock, Docstring, ExpressionKeyword, GenericCode,
    InlineKeyword, KeywordHeader, ListKeyword, Parameter, StructuralKeyword,
};
pub use keywords::{KeywordCategory, KeywordTable, Scope};
pub use lexer::tokenize;
pub use params::{Split, SplitItem, positional_first, split_parameters, split_top_level};
pub use parser::parse;
pub use token::{Span, StringStyle, Token, TokenKind};
pub use trivia::normalize_comment;
