//! Word Codec adapter (§6, §4.6) - `docx-rs`/`zip`-backed implementation of
//! `WordCodecParser` and `WordCodecRenderer`.

mod docx_codec;

pub use docx_codec::DocxCodec;
