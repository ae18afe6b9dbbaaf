//! Patch grouped `<method>` / `<transport>` entries of XML config files.
//!
//! The crate carries a small arena-backed XML tree ([`Document`], [`Element`], [`Node`])
//! built on quick-xml, and the patcher on top of it ([`patch`]).
//!
//! # Example
//!
//! ```
//! use config_patcher::{apply, Document, MissingGroup, Patch};
//!
//! let mut doc = Document::parse_str(
//!     r#"<config><method group="READ_METHOD" method="BP">verbose=3</method></config>"#,
//! ).unwrap();
//! let patch = Patch::new("READ_METHOD", "MPI", "verbose=1");
//! let changes = apply(&mut doc, "method", &patch, MissingGroup::Fail).unwrap();
//! assert_eq!(changes[0].to_string(), "Changing method: BP => MPI\nChanging params: verbose=3 => verbose=1");
//! ```
//!
//! Text is kept exactly as read, whitespace included, so the layout of the
//! input comes back out unchanged. The output is always UTF-8 with a declaration,
//! and each top level node starts on its own line.
//!
//! Empty params are reported as `None`, like a missing body. A matched entry
//! patched with empty params is written as `<method ...></method>`, while an
//! untouched `<method/>` stays self-closing.

pub mod cli;
mod document;
mod element;
mod error;
mod parser;
pub mod patch;

pub use crate::document::{Document, Node, ReadOptions};
pub use crate::element::{Attributes, Element};
pub use crate::error::{Error, Result};
pub use crate::patch::{apply, run, Change, MissingGroup, Patch, PatchOptions, Report, Variant};
