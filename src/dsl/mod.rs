//! DSL (Domain Specific Language) parser for operating point descriptions.
//!
//! A SPICE-inspired, line-oriented language that sets the converter
//! operating point and, optionally, replaces the built-in device models.
//!
//! # Grammar Overview
//!
//! ```text
//! description = { line }
//! line        = comment | directive | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = '.' directive_name { argument }
//!
//! .param   <name> <value>
//! .current <mode> { key '=' value }
//! .model   <name> <type> [ '(' { key '=' value } ')' ]
//! .curve   <model> { current energy }
//! .use     <family> <model>
//!
//! number      = ['-'|'+'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+] [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! identifier  = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! # Directives
//!
//! | Directive | Description | Syntax |
//! |-----------|-------------|--------|
//! | .param | Operating point value (`v1 v2 ar ief fr fp`) | `.param fp 21.6k` |
//! | .current | Load current shape | `.current linear phase=0` / `.current nonlinear crest=2` |
//! | .model | Device model (`SW` or `D`) | `.model UF5408 D (p0=1.127 ... trr=75n irr=0.25)` |
//! | .curve | Switching energy curve (A, mJ) | `.curve IRG4PC50UD 0 0 13.554 1.1391` |
//! | .use | Assign a model to a family (`switch diode bridge`) | `.use bridge UF5408` |
//!
//! # Example
//!
//! ```text
//! # 300 V seven-level inverter, 4.25 A resistive load
//! .param v1 100
//! .param v2 200
//! .param ar 300
//! .param ief 4.25
//! .param fr 60
//! .param fp 21.6k
//! .current linear phase=0
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a description string into an AST.
pub fn parse(input: &str) -> Result<DescriptionAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a description file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<DescriptionAst> {
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::error::ConvlossError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
    parse(&content)
}
