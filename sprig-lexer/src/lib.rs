pub use lexer::{CharStream, Checkpoint, Lexer, LexerBuilder, Token, Tokens};

pub mod fsm;
pub mod regex;

mod lexer;
