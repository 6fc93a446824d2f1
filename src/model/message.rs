//! The message assembled from one HTML document.

use super::address::EmailAddress;
use super::attachment::Attachment;

/// Everything needed to write one `.eml` file.
#[derive(Debug, Clone)]
pub struct Message {
    /// Sender. Omitted from the output when its address is empty.
    pub from: EmailAddress,

    /// Single recipient. Omitted from the output when its address is empty.
    pub to: EmailAddress,

    /// Document title, or empty.
    pub subject: String,

    /// Value of the `Date:` header, already in RFC 2822 form.
    pub date: String,

    /// Sanitized and rewritten HTML.
    pub html: String,

    /// Embedded resources, in the order they were first referenced.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Total size of all embedded payloads.
    pub fn attachments_size(&self) -> u64 {
        self.attachments.iter().map(Attachment::size).sum()
    }
}
