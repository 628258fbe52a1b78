use crate::config::SpoolConfig;
use crate::constants;
use crate::error::ResultExt;
use crate::header::extract_param;
use crate::part::{Part, PartMeta};
use crate::spool::SpoolBuffer;
use crate::state::{DecodingStage, OpenPart};
use std::io::Write;

/// A line-driven `multipart/form-data` state machine.
///
/// The decoder does no I/O of its own: it is fed one line at a time, each
/// line including its trailing `\n`, and collects the decoded [`Part`]s. The
/// blocking [`decode`](crate::decode) function and the async
/// [`Multipart`](crate::Multipart) both drive it.
///
/// # Examples
///
/// ```
/// use formspool::Decoder;
///
/// let mut decoder = Decoder::new("XYZ").unwrap();
///
/// for line in ["--XYZ\r\n", "Content-Disposition: form-data; name=\"text\"\r\n", "\r\n", "hello\r\n", "--XYZ--\r\n"].iter() {
///     if decoder.feed_line(line.as_bytes()).unwrap() {
///         break;
///     }
/// }
///
/// let parts = decoder.finish().unwrap();
/// assert_eq!(parts.len(), 1);
/// assert_eq!(parts[0].name(), Some("text"));
/// ```
#[derive(Debug)]
pub struct Decoder {
    separator: Vec<u8>,
    terminator: Vec<u8>,
    stage: DecodingStage,
    config: SpoolConfig,
    pending_content_type: Option<mime::Mime>,
    curr_part: Option<OpenPart>,
    parts: Vec<Part>,
}

impl Decoder {
    /// Creates a decoder for `boundary` with the default [`SpoolConfig`].
    pub fn new<B: AsRef<str>>(boundary: B) -> crate::Result<Decoder> {
        Decoder::with_config(boundary, SpoolConfig::default())
    }

    /// Creates a decoder for `boundary` buffering parts as `config` says.
    ///
    /// An empty boundary is rejected with [`Error::NoBoundary`](crate::Error::NoBoundary).
    pub fn with_config<B: AsRef<str>>(boundary: B, config: SpoolConfig) -> crate::Result<Decoder> {
        let boundary = boundary.as_ref();

        if boundary.is_empty() {
            return Err(crate::Error::NoBoundary);
        }

        Ok(Decoder {
            separator: constants::separator(boundary),
            terminator: constants::terminator(boundary),
            stage: DecodingStage::SeekingFirstBoundary,
            config,
            pending_content_type: None,
            curr_part: None,
            parts: Vec::new(),
        })
    }

    /// Whether the terminating delimiter has been seen.
    pub fn is_done(&self) -> bool {
        self.stage == DecodingStage::Done
    }

    /// Advances the decoder by one line and returns `true` once the whole
    /// body has been decoded. Lines fed after that are ignored.
    pub fn feed_line(&mut self, line: &[u8]) -> crate::Result<bool> {
        match self.stage {
            DecodingStage::SeekingFirstBoundary => {
                if line == self.separator.as_slice() {
                    log::trace!("found the first multipart boundary");
                    self.stage = DecodingStage::SeekingDisposition;
                }
            }
            DecodingStage::SeekingDisposition => {
                if constants::starts_with_marker(line, constants::CONTENT_DISPOSITION_MARKER) {
                    self.open_part(line);
                    self.stage = DecodingStage::SeekingEndOfHeaders;
                } else {
                    self.note_content_type(line);
                }
            }
            DecodingStage::SeekingEndOfHeaders => {
                if line == constants::CRLF.as_bytes() {
                    self.stage = DecodingStage::AccumulatingBody;
                } else {
                    self.note_content_type(line);
                }
            }
            DecodingStage::AccumulatingBody => {
                if line == self.separator.as_slice() {
                    self.close_part()?;
                    self.stage = DecodingStage::SeekingDisposition;
                } else if line == self.terminator.as_slice() {
                    self.close_part()?;
                    self.stage = DecodingStage::Done;
                    log::debug!("decoded {} multipart parts", self.parts.len());
                } else if let Some(part) = self.curr_part.as_mut() {
                    part.content.write_all(line).spool_context()?;
                }
            }
            DecodingStage::Done => {}
        }

        Ok(self.is_done())
    }

    /// Returns the decoded parts, or [`Error::IncompleteStream`](crate::Error::IncompleteStream)
    /// if the terminating delimiter never arrived. A part left open is dropped
    /// along with everything else in that case.
    pub fn finish(self) -> crate::Result<Vec<Part>> {
        if self.is_done() {
            Ok(self.parts)
        } else {
            log::debug!("multipart stream ended early while {:?}", self.stage);
            Err(crate::Error::IncompleteStream)
        }
    }

    fn open_part(&mut self, line: &[u8]) {
        let header = String::from_utf8_lossy(line);
        let header = header.trim_end();
        let idx = self.parts.len();

        let meta = PartMeta {
            name: extract_param(constants::NAME_PARAM, header),
            file_name: extract_param(constants::FILE_NAME_PARAM, header),
            content_type: self.pending_content_type.take(),
            idx,
        };

        if meta.name.is_empty() {
            log::debug!("part {} has no field name: {:?}", idx, header);
        } else {
            log::trace!("opening part {} '{}'", idx, meta.name);
        }

        self.curr_part = Some(OpenPart {
            meta,
            content: SpoolBuffer::new(&self.config),
        });
    }

    fn close_part(&mut self) -> crate::Result<()> {
        if let Some(OpenPart { meta, mut content }) = self.curr_part.take() {
            content.seal().spool_context()?;
            log::trace!("closing part {} with {} bytes", meta.idx, content.len());
            self.parts.push(Part::new(meta, content));
        }

        Ok(())
    }

    // Per-part headers other than Content-Disposition are skipped, except that
    // a parseable Content-Type is kept for the part it belongs to.
    fn note_content_type(&mut self, line: &[u8]) {
        if !constants::starts_with_marker(line, constants::CONTENT_TYPE_MARKER) {
            return;
        }

        let value = String::from_utf8_lossy(&line[constants::CONTENT_TYPE_MARKER.len()..]);
        let content_type = value.trim().parse::<mime::Mime>().ok();

        match self.curr_part.as_mut() {
            Some(part) => part.meta.content_type = content_type,
            None => self.pending_content_type = content_type,
        }
    }
}
