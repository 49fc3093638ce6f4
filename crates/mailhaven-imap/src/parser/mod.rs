//! Sans-I/O response parsing: lexer, typed value tree, response grammar.

pub mod lexer;
mod response;
pub mod value;

pub use response::{
    BodyStructure, Envelope, EnvelopeAddress, FetchItem, Response, ResponseParser,
    UntaggedResponse,
};
pub use value::Value;
