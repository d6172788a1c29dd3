//! dbcsmap: compile double-byte charset mapping tables into a binary lookup format.
//!
//! A mapping table is a text file of `0x<bytes> U+<code point>[+<code point>] # comment`
//! lines. This crate turns it into the sectioned blob a runtime charset
//! decoder loads (see [`encoder`] for the exact wire format).
//!
//! # Pipeline
//!
//! - [`parser`]: line tokenizer and streaming [`MappingParser`]
//! - [`tables`]: [`Classifier`] routing records into single-byte, double-byte,
//!   supplement and composite tables plus the encode-side presence index
//! - [`encoder`]: section writer producing the size-prefixed blob
//! - [`reader`]: [`TableImage`] parsing a blob back for verification and lookup
//! - [`driver`]: [`compile`] (in memory) and [`generate`] (file to file, atomic)

pub mod driver;
pub mod encoder;
pub mod error;
pub mod mapping;
pub mod options;
pub mod parser;
pub mod reader;
pub mod tables;

pub use driver::{GenerateSummary, compile, generate};
pub use encoder::encode;
pub use error::{MapError, Result};
pub use mapping::{EntryKind, MAX_DENSE_CODE_POINT, MappingEntry, UNMAPPABLE};
pub use options::{Band, ByteRange, DbcsLayout, GenerateOptions, MalformedPolicy, OutOfBandPolicy};
pub use parser::{Line, MappingParser, tokenize_line};
pub use reader::{Lookup, TableImage};
pub use tables::{
    Classifier, ClassifyStats, DoubleByteTable, EncodeIndex, MappingTables, Placement,
    SingleByteTable,
};
