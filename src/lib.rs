//! Tabular editing of JSON Lines files
//!
//! The host side ([`session::Session`]) owns the parsed [`document::Document`]
//! and its undo history; the renderer side ([`grid::GridModel`]) holds a
//! chunked copy of the rows plus subtable expansion state. The two talk
//! through the messages in [`protocol`].

pub mod codec;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod expansion;
pub mod grid;
pub mod protocol;
pub mod record;
pub mod router;
pub mod schema;
pub mod search;
pub mod session;
pub mod storage;
pub mod theme;

pub use error::{GridError, Result};
