use crate::part::PartMeta;
use crate::spool::SpoolBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodingStage {
    SeekingFirstBoundary,
    SeekingDisposition,
    SeekingEndOfHeaders,
    AccumulatingBody,
    Done,
}

/// The part currently being decoded, between its `Content-Disposition` line
/// and its closing delimiter.
#[derive(Debug)]
pub(crate) struct OpenPart {
    pub(crate) meta: PartMeta,
    pub(crate) content: SpoolBuffer,
}
