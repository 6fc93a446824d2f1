//! Per-document conversion pipeline.
//!
//! Each HTML file goes through load → sanitize → resolve → assemble → write.
//! A file whose `.eml` already exists (and is non-empty) is skipped, which
//! lets an interrupted batch be resumed by running it again.

use std::fmt;
use std::path::{Path, PathBuf};

use humansize::{format_size, BINARY};
use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::export::date::{self, DateSource};
use crate::export::eml;
use crate::html::{self, rewrite, sanitize::Sanitizer};
use crate::model::address::EmailAddress;
use crate::model::message::Message;
use crate::resource::{ContentIdTable, Resolver};

/// Pipeline step, used in diagnostics and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Sanitize,
    Resolve,
    Assemble,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "loading",
            Self::Sanitize => "sanitizing",
            Self::Resolve => "resolving resources",
            Self::Assemble => "assembling",
            Self::Write => "writing",
        })
    }
}

/// Settings shared by every document in a run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// `From:` of generated messages.
    pub from: EmailAddress,
    /// `To:` of generated messages.
    pub to: EmailAddress,
    /// Additional selectors removed as boilerplate.
    pub extra_selectors: Vec<String>,
}

/// Summary of a converted document.
#[derive(Debug, Clone)]
pub struct Report {
    /// Input HTML file.
    pub source: PathBuf,
    /// Written message file.
    pub eml: PathBuf,
    /// Size of the written file.
    pub bytes: u64,
    /// Number of embedded resources.
    pub attachments: usize,
    /// References that were left as they were.
    pub unresolved: usize,
    /// Origin of the `Date:` header.
    pub date_source: DateSource,
}

/// What happened to one input.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The output already existed.
    Skipped { eml: PathBuf },
    /// A message was written.
    Written(Report),
}

/// Converts HTML documents to `.eml` files.
#[derive(Debug, Clone)]
pub struct Converter {
    options: Options,
    sanitizer: Sanitizer,
}

impl Converter {
    pub fn new(options: Options) -> Self {
        let sanitizer = Sanitizer::new().with_extra_selectors(options.extra_selectors.clone());
        Self { options, sanitizer }
    }

    /// Convert every input in order, stopping at the first failure.
    ///
    /// The returned error names the file that failed.
    pub fn convert_all<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<Vec<Outcome>> {
        if inputs.is_empty() {
            return Err(ConvertError::NoInputs);
        }

        inputs
            .iter()
            .map(|input| {
                let input = input.as_ref();
                self.convert(input).map_err(|e| ConvertError::Failed {
                    path: input.to_path_buf(),
                    source: Box::new(e),
                })
            })
            .collect()
    }

    /// Convert a single HTML file next to itself.
    pub fn convert(&self, source: &Path) -> Result<Outcome> {
        info!("processing {}", source.display());

        let eml_path = eml::eml_path(source);
        if eml::already_converted(&eml_path) {
            info!("{} exist, skipped", eml_path.display());
            return Ok(Outcome::Skipped { eml: eml_path });
        }

        let raw = std::fs::read(source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::FileNotFound(source.to_path_buf())
            } else {
                ConvertError::io(source, e)
            }
        })?;
        let markup = html::decode_source(&raw);
        debug!(path = %source.display(), stage = %Stage::Load, bytes = raw.len(), "Document loaded");

        let sanitized = self
            .sanitizer
            .sanitize(&markup)
            .map_err(|e| ConvertError::html(source, Stage::Sanitize, e))?;
        debug!(path = %source.display(), stage = %Stage::Sanitize, "Document sanitized");

        let resolver = Resolver::for_document(source);
        let mut table = ContentIdTable::new();
        let rewritten = rewrite::rewrite_resources(&sanitized, &resolver, &mut table)
            .map_err(|e| ConvertError::html(source, Stage::Resolve, e))?;
        debug!(
            path = %source.display(),
            stage = %Stage::Resolve,
            rewritten = rewritten.rewritten,
            unresolved = rewritten.unresolved,
            "Resources resolved"
        );

        let (date, date_source) = date::message_date(source, &rewritten.metadata.publish_dates);
        let message = Message {
            from: self.options.from.clone(),
            to: self.options.to.clone(),
            subject: rewritten.metadata.title.unwrap_or_default(),
            date,
            html: rewritten.html,
            attachments: table.into_attachments(),
        };

        let bytes = eml::write_eml(&message, source, &eml_path)?;
        info!(
            "wrote {} ({}, {} attachment(s), {} embedded)",
            eml_path.display(),
            format_size(bytes, BINARY),
            message.attachments.len(),
            format_size(message.attachments_size(), BINARY),
        );

        Ok(Outcome::Written(Report {
            source: source.to_path_buf(),
            eml: eml_path,
            bytes,
            attachments: message.attachments.len(),
            unresolved: rewritten.unresolved,
            date_source,
        }))
    }
}
