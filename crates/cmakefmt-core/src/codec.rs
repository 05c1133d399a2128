// crates/cmakefmt-core/src/codec.rs - Text Codec Resolution
//
// Maps an encoding name from the command line to a decode/encode pair.
// The ISO-8859-1 family ("latin1", "iso-8859-1", "l1", ...) maps each
// byte to the code point of the same value. Every other name goes through
// the WHATWG label registry.
//
// STRICTNESS:
// - Unknown names fail before any file or stream is touched
// - Malformed input never turns into replacement characters
// - Unmappable output characters never get silently dropped

use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_8};
use std::fmt;
use thiserror::Error;

/// Name of the encoding used when none is requested
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Canonical name reported for the ISO-8859-1 codec
const LATIN1_NAME: &str = "iso-8859-1";

/// Labels that never reach the registry, where they would mean windows-1252
const LATIN1_LABELS: &[&str] = &[
    "latin1",
    "latin-1",
    "latin_1",
    "latin",
    "l1",
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso_8859_1",
    "iso88591",
    "8859",
    "cp819",
    "ibm819",
    "iso-ir-100",
    "csisolatin1",
];

/// Errors that can occur while resolving or applying a codec
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Encoding '{0}' can only be used for input")]
    DecodeOnly(String),

    #[error("Input is not valid {encoding}: malformed byte sequence at offset {offset}")]
    Decode { encoding: String, offset: usize },

    #[error("Output cannot be encoded as {encoding}: {character:?} at byte offset {offset}")]
    Encode {
        encoding: String,
        character: char,
        offset: usize,
    },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// A resolved text encoding
///
/// Keeps `encoding_rs` an implementation detail of this module.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    scheme: Scheme,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scheme {
    /// ISO-8859-1: byte N is code point U+00NN
    Latin1,
    Registry(&'static Encoding),
}

impl Codec {
    /// Resolve an encoding name (case-insensitive, surrounding whitespace ignored)
    pub fn for_name(name: &str) -> CodecResult<Self> {
        let label = name.trim().to_ascii_lowercase();
        if LATIN1_LABELS.contains(&label.as_str()) {
            return Ok(Self {
                scheme: Scheme::Latin1,
            });
        }

        Encoding::for_label(label.as_bytes())
            .map(|encoding| Self {
                scheme: Scheme::Registry(encoding),
            })
            .ok_or_else(|| CodecError::UnsupportedEncoding(name.to_string()))
    }

    /// Resolve an encoding that will be used to write output
    ///
    /// Some registry entries (UTF-16, "replacement") decode fine but have
    /// no encoder of their own; those are rejected here rather than
    /// quietly producing UTF-8.
    pub fn for_output(name: &str) -> CodecResult<Self> {
        let codec = Self::for_name(name)?;
        match codec.scheme {
            Scheme::Registry(encoding) if encoding.output_encoding() != encoding => {
                Err(CodecError::DecodeOnly(codec.name().to_string()))
            }
            _ => Ok(codec),
        }
    }

    /// Canonical name, e.g. "iso-8859-1" for "latin1" or "UTF-8" for "utf8"
    pub fn name(&self) -> &'static str {
        match self.scheme {
            Scheme::Latin1 => LATIN1_NAME,
            Scheme::Registry(encoding) => encoding.name(),
        }
    }

    /// Decode raw bytes into text, failing on the first malformed sequence
    ///
    /// ISO-8859-1 cannot fail: every byte is a valid code point.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<String> {
        match self.scheme {
            Scheme::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Scheme::Registry(encoding) => self.decode_registry(encoding, bytes),
        }
    }

    /// Encode text into raw bytes, failing on the first unmappable character
    pub fn encode(&self, text: &str) -> CodecResult<Vec<u8>> {
        match self.scheme {
            Scheme::Latin1 => self.encode_latin1(text),
            Scheme::Registry(encoding) if encoding == UTF_8 => Ok(text.as_bytes().to_vec()),
            Scheme::Registry(encoding) => self.encode_registry(encoding, text),
        }
    }

    fn encode_latin1(&self, text: &str) -> CodecResult<Vec<u8>> {
        text.char_indices()
            .map(|(offset, character)| {
                u8::try_from(character).map_err(|_| CodecError::Encode {
                    encoding: self.name().to_string(),
                    character,
                    offset,
                })
            })
            .collect()
    }

    /// Strict registry decode
    ///
    /// ALGORITHM:
    /// Drives an `encoding_rs` decoder without replacement. The decoder
    /// reports how many bytes it consumed and the length of the malformed
    /// sequence plus any bytes read past it, which lets us recover the
    /// offset of the offending byte.
    fn decode_registry(&self, encoding: &'static Encoding, bytes: &[u8]) -> CodecResult<String> {
        let mut decoder = encoding.new_decoder_without_bom_handling();
        let capacity = decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len());
        let mut text = String::with_capacity(capacity);
        let mut consumed = 0;

        loop {
            let (result, read) =
                decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut text, true);
            consumed += read;

            match result {
                DecoderResult::InputEmpty => return Ok(text),
                DecoderResult::OutputFull => {
                    let remaining = bytes.len() - consumed;
                    text.reserve(
                        decoder
                            .max_utf8_buffer_length_without_replacement(remaining)
                            .unwrap_or(remaining)
                            .max(4),
                    );
                }
                DecoderResult::Malformed(bad, extra) => {
                    let offset = consumed - usize::from(bad) - usize::from(extra);
                    return Err(CodecError::Decode {
                        encoding: self.name().to_string(),
                        offset,
                    });
                }
            }
        }
    }

    fn encode_registry(&self, encoding: &'static Encoding, text: &str) -> CodecResult<Vec<u8>> {
        let mut encoder = encoding.new_encoder();
        let capacity = encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len());
        let mut bytes = Vec::with_capacity(capacity);
        let mut consumed = 0;

        loop {
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut bytes, true);
            consumed += read;

            match result {
                EncoderResult::InputEmpty => return Ok(bytes),
                EncoderResult::OutputFull => {
                    let remaining = text.len() - consumed;
                    bytes.reserve(
                        encoder
                            .max_buffer_length_from_utf8_without_replacement(remaining)
                            .unwrap_or(remaining)
                            .max(8),
                    );
                }
                EncoderResult::Unmappable(character) => {
                    return Err(CodecError::Encode {
                        encoding: self.name().to_string(),
                        character,
                        offset: consumed - character.len_utf8(),
                    });
                }
            }
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            scheme: Scheme::Registry(UTF_8),
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Codec").field(&self.name()).finish()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
