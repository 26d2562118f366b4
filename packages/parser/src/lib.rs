//! # Arbor Parser
//!
//! Codec between behavior documents and their XML wire format.
//!
//! ```text
//! parse:      text → tokenize → parse_markup → Decoder → Document
//! serialize:  Document → Serializer → text
//! ```
//!
//! `parse(serialize(doc))` preserves component ids, graph shape, field
//! bindings and ports. Node ids are synthesized on every parse, and local
//! variables are re-derived from `SetBlackboard` nodes.

pub mod catalog;
pub mod error;
pub mod markup;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_serializer;

pub use error::{CodecError, ParseError, ParseResult};
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use markup::{parse_markup, Element};
pub use parser::{parse, parse_components};
pub use serializer::{serialize, serialize_components, Serializer};
pub use tokenizer::{tokenize, Token};
