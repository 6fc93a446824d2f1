//! `html2eml`: convert saved HTML pages into self-contained `.eml` messages.
//!
//! This crate provides the conversion pipeline: sanitizing the markup,
//! embedding local and inline resources as `cid:` attachments, and writing
//! the resulting multipart message next to the source file.

pub mod config;
pub mod error;
pub mod export;
pub mod html;
pub mod model;
pub mod pipeline;
pub mod resource;

pub use error::{ConvertError, Result};
pub use pipeline::{Converter, Options, Outcome};
