//! Embedded resources carried by a generated message.

/// A resource embedded in the message and referenced from the body by `cid:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Content-ID, without angle brackets (e.g. `"3a7b…e1.png"`).
    pub content_id: String,

    /// MIME content type (e.g. `"image/png"`).
    pub content_type: String,

    /// Raw payload bytes.
    pub data: Vec<u8>,

    /// `true` when the part is rendered inline against the HTML body
    /// (`multipart/related`) rather than offered as a download.
    pub related: bool,
}

impl Attachment {
    /// An inline resource referenced from the HTML body.
    pub fn related(
        content_id: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            content_type: content_type.into(),
            data,
            related: true,
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
