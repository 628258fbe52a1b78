use crate::error::ResultExt;
use crate::spool::SpoolBuffer;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// A single decoded part of a `multipart/form-data` body: either a file upload
/// or a plain form field.
///
/// The content is sealed and rewound when the part is handed out, so reading
/// from [`content_mut`](Part::content_mut) starts at the first byte.
#[derive(Debug)]
pub struct Part {
    meta: PartMeta,
    content: SpoolBuffer,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PartMeta {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) content_type: Option<mime::Mime>,
    pub(crate) idx: usize,
}

impl Part {
    pub(crate) fn new(meta: PartMeta, content: SpoolBuffer) -> Self {
        Part { meta, content }
    }

    /// The field name found in the `Content-Disposition` header, or `None`
    /// when the header carried no usable `name` parameter.
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.meta.name)
    }

    /// The file name found in the `Content-Disposition` header. `None` means
    /// the client supplied no file name, e.g. a file input left empty.
    pub fn file_name(&self) -> Option<&str> {
        non_empty(&self.meta.file_name)
    }

    /// The part's own `Content-Type` header as [`mime::Mime`], if present.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// The position of this part in the multipart body, starting at zero.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// The content length in bytes.
    pub fn len(&self) -> u64 {
        self.content.len()
    }

    /// Whether the part has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Mutable access to the buffered content.
    pub fn content_mut(&mut self) -> &mut SpoolBuffer {
        &mut self.content
    }

    /// Takes the buffered content out of the part.
    pub fn into_content(self) -> SpoolBuffer {
        self.content
    }

    /// Reads the whole content into memory.
    pub fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = Vec::with_capacity(self.content.len() as usize);

        self.content
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.content.read_to_end(&mut buf))
            .spool_context()?;

        Ok(Bytes::from(buf))
    }

    /// Reads the content as text, assuming UTF-8 unless the part's
    /// `Content-Type` names another charset.
    ///
    /// Invalid sequences are replaced, never rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let mut parts = formspool::decode(data.as_bytes(), "X-BOUNDARY").unwrap();
    ///
    /// assert_eq!(parts.remove(0).text().unwrap(), "abcd");
    /// ```
    pub fn text(self) -> crate::Result<String> {
        self.text_with_charset("utf-8")
    }

    /// Reads the content as text with `default_encoding` used when the part's
    /// `Content-Type` carries no `charset` parameter.
    pub fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding);

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes()?;

        let (text, _, _) = encoding.decode(&bytes);

        Ok(text.into_owned())
    }

    /// Parses the content as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    pub fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(crate::Error::DecodeJson)
    }

    /// Writes the content to `path`, replacing any existing file, and returns
    /// the number of bytes written.
    pub fn persist_to<P: AsRef<Path>>(&mut self, path: P) -> crate::Result<u64> {
        let mut file = File::create(path.as_ref()).store_context()?;

        self.content.seek(SeekFrom::Start(0)).store_context()?;
        let written = io::copy(&mut self.content, &mut file).store_context()?;

        log::debug!("persisted part {} ({} bytes) to {:?}", self.meta.idx, written, path.as_ref());

        Ok(written)
    }
}

fn non_empty(val: &str) -> Option<&str> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}
