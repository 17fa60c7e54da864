//!
//! Document payloads and transport encoding
//!
use std::fmt;

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    Engine,
};
use bytes::Bytes;
use enum_as_inner::EnumAsInner;

use crate::error::PrintError;

/// Document content as handed over by a fetcher
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Document {
    /// Raw document bytes
    Raw(Bytes),
    /// Document that already went through a base64 hand-off
    Base64(String),
}

impl Document {
    /// Byte length of the raw document, when known without decoding
    pub fn raw_len(&self) -> Option<usize> {
        match self {
            Document::Raw(bytes) => Some(bytes.len()),
            Document::Base64(_) => None,
        }
    }
}

impl From<Bytes> for Document {
    fn from(bytes: Bytes) -> Self {
        Document::Raw(bytes)
    }
}

impl From<Vec<u8>> for Document {
    fn from(bytes: Vec<u8>) -> Self {
        Document::Raw(bytes.into())
    }
}

/// Base64-encoded document ready for submission.
///
/// Always holds canonical standard base64 with padding.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportPayload(String);

impl TransportPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the payload back into document bytes
    pub fn decode(&self) -> Result<Bytes, PrintError> {
        Ok(STANDARD.decode(&self.0)?.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for TransportPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransportPayload({} chars)", self.0.len())
    }
}

/// Turns fetched documents into transport payloads.
///
/// Implementations must be idempotent: encoding a document that is already
/// encoded yields the same payload as encoding its decoded bytes.
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, document: &Document) -> Result<TransportPayload, PrintError>;
}

const LENIENT_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

// accepts padded and unpadded input
const LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

fn decode_lenient(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    LENIENT
        .decode(text)
        .or_else(|e| LENIENT_URL_SAFE.decode(text).map_err(|_| e))
}

/// Standard base64 encoder used by PrintNode's `pdf_base64` content type
#[derive(Debug, Copy, Clone, Default)]
pub struct Base64Encoder;

impl PayloadEncoder for Base64Encoder {
    fn encode(&self, document: &Document) -> Result<TransportPayload, PrintError> {
        match document {
            Document::Raw(bytes) => Ok(TransportPayload(STANDARD.encode(bytes))),
            Document::Base64(text) => {
                // whitespace and line breaks are common after a text hand-off
                let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let decoded = decode_lenient(&compact)?;
                Ok(TransportPayload(STANDARD.encode(decoded)))
            }
        }
    }
}
