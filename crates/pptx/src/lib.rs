//! PPTX (Office Open XML) parser backend for presentation decks.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into a
//! [`deck_core::Presentation`].

pub mod archive;
pub mod numbering;
pub mod parser;
pub mod rels;
pub mod sections;
pub mod slide;
pub mod text;
pub mod xml;

pub use parser::PptxParser;
