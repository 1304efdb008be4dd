//! Line tokenizer using syntect
//!
//! Each line is parsed with the lexer state left behind by the previous line,
//! so multi-line constructs (block comments, strings, heredocs) keep their
//! scopes. Tokens carry the full scope stack as strings; style resolution
//! happens separately in the styler.

use std::fmt;

use syntect::parsing::{ParseState, ScopeStack};

use super::grammar_registry::Grammar;
use crate::error::TokenizeError;

/// A scoped byte range within one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Outermost scope first
    pub scopes: Vec<String>,
}

/// Lexer state carried from one line to the next
#[derive(Clone)]
pub struct LexerState {
    parse: ParseState,
    scopes: ScopeStack,
}

impl fmt::Debug for LexerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexerState")
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl Grammar {
    /// Initial lexer state for this grammar
    pub fn initial_state(&self) -> LexerState {
        LexerState {
            parse: ParseState::new(self.syntax()),
            scopes: ScopeStack::new(),
        }
    }

    /// Tokenize one line (without its line terminator)
    ///
    /// `prior` is the state returned for the previous line, or `None` for the
    /// first line. Token offsets are clamped to the line length and zero-width
    /// tokens are dropped.
    pub fn tokenize_line(
        &self,
        line: &str,
        prior: Option<LexerState>,
    ) -> Result<(Vec<Token>, LexerState), TokenizeError> {
        let mut state = prior.unwrap_or_else(|| self.initial_state());
        let line_with_newline = format!("{}\n", line);
        let line_len = line.len();

        let ops = state.parse.parse_line(&line_with_newline, self.syntax_set())?;

        let mut tokens = Vec::new();
        let mut syntect_offset = 0;

        for (op_offset, op) in ops {
            let clamped_offset = op_offset.min(line_len);
            if clamped_offset > syntect_offset {
                push_token(&mut tokens, syntect_offset, clamped_offset, &state.scopes);
            }
            syntect_offset = syntect_offset.max(clamped_offset);
            state.scopes.apply(&op)?;
        }

        // Remaining text after the last operation
        if syntect_offset < line_len {
            push_token(&mut tokens, syntect_offset, line_len, &state.scopes);
        }

        Ok((tokens, state))
    }
}

fn push_token(tokens: &mut Vec<Token>, start: usize, end: usize, stack: &ScopeStack) {
    if start >= end {
        return;
    }
    let scopes: Vec<String> = stack
        .as_slice()
        .iter()
        .map(|scope| scope.build_string())
        .collect();

    // Merge with the previous token when the scope stack did not change
    if let Some(last) = tokens.last_mut() {
        if last.end == start && last.scopes == scopes {
            last.end = end;
            return;
        }
    }
    tokens.push(Token { start, end, scopes });
}
