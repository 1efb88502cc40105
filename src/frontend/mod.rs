//! Front end: lexical analysis, parsing and semantic analysis.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use semantic::{SemanticAnalyzer, SemanticConfig};
pub use token::{Token, TokenKind};
