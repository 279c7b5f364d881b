//! Error types for marsdash-parser

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error at {location}: {message}")]
    SyntaxError { location: String, message: String },

    #[error("IO error reading {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },
}
