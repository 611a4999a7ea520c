//! RFC 2047 encoded-word decoding for display names.
//!
//! Text outside encoded words is kept verbatim. Whitespace between two
//! adjacent encoded words is dropped, as RFC 2047 section 6.2 requires.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chumsky::prelude::*;
use log::trace;
use thiserror::Error;

use super::grammar::Extra;

/// Standard alphabet, padding optional. Plenty of mailers drop the `=`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodedWordError {
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
    #[error("unknown encoding {0:?}")]
    UnknownEncoding(char),
    #[error("invalid base64 data {0:?}")]
    InvalidBase64(String),
    #[error("invalid quoted-printable data {0:?}")]
    InvalidQuotedPrintable(String),
}

/// The three fields of `=?charset?encoding?data?=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EncodedWord<'src> {
    charset: &'src str,
    encoding: char,
    data: &'src str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'src> {
    Encoded(EncodedWord<'src>),
    Space(&'src str),
    Text(&'src str),
}

fn encoded_word_fields<'src>() -> impl Parser<'src, &'src str, EncodedWord<'src>, Extra<'src>> + Clone
{
    just("=?")
        .ignore_then(none_of("? ").repeated().at_least(1).to_slice())
        .then_ignore(just('?'))
        .then(none_of("? "))
        .then_ignore(just('?'))
        .then(none_of("? ").repeated().to_slice())
        .then_ignore(just("?="))
        .map(|((charset, encoding), data)| EncodedWord {
            charset,
            encoding,
            data,
        })
}

fn tokens<'src>() -> impl Parser<'src, &'src str, Vec<Token<'src>>, Extra<'src>> {
    choice((
        encoded_word_fields().map(Token::Encoded),
        one_of(" \t")
            .repeated()
            .at_least(1)
            .to_slice()
            .map(Token::Space),
        none_of("= \t")
            .repeated()
            .at_least(1)
            .to_slice()
            .map(Token::Text),
        // A lone '=' that does not start an encoded word.
        any().to_slice().map(Token::Text),
    ))
    .repeated()
    .collect::<Vec<_>>()
}

/// Decode every encoded word in `text`.
pub fn decode_encoded_words(text: &str) -> Result<String, EncodedWordError> {
    if !text.contains("=?") {
        return Ok(text.to_string());
    }

    let tokens = match tokens().parse(text).into_result() {
        Ok(tokens) => tokens,
        Err(_) => return Ok(text.to_string()),
    };

    let mut result = String::with_capacity(text.len());
    let mut previous_was_encoded = false;
    let mut pending_space: Option<&str> = None;

    for token in tokens {
        match token {
            Token::Encoded(word) => {
                if let Some(space) = pending_space.take() {
                    if !previous_was_encoded {
                        result.push_str(space);
                    }
                }
                result.push_str(&decode_word(&word)?);
                previous_was_encoded = true;
            }
            Token::Space(space) => {
                if let Some(previous) = pending_space.take() {
                    result.push_str(previous);
                }
                pending_space = Some(space);
            }
            Token::Text(literal) => {
                if let Some(space) = pending_space.take() {
                    result.push_str(space);
                }
                result.push_str(literal);
                previous_was_encoded = false;
            }
        }
    }
    if let Some(space) = pending_space {
        result.push_str(space);
    }

    trace!("Decoded encoded words {:?} to {:?}", text, result);
    Ok(result)
}

fn decode_word(word: &EncodedWord<'_>) -> Result<String, EncodedWordError> {
    let bytes = match word.encoding.to_ascii_uppercase() {
        'B' => LENIENT_BASE64
            .decode(word.data)
            .map_err(|_| EncodedWordError::InvalidBase64(word.data.to_string()))?,
        'Q' => decode_q(word.data)?,
        other => return Err(EncodedWordError::UnknownEncoding(other)),
    };

    // RFC 2231 allows a language suffix: =?utf-8*en?q?...?=
    let label = word.charset.split('*').next().unwrap_or(word.charset);
    let encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodedWordError::UnknownCharset(word.charset.to_string()))?;
    let (decoded, _) = encoding.decode_without_bom_handling(&bytes);
    Ok(decoded.into_owned())
}

/// Q encoding: `_` is a space, `=XX` is a hex escaped byte.
fn decode_q(data: &str) -> Result<Vec<u8>, EncodedWordError> {
    let bytes = data.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let byte = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| EncodedWordError::InvalidQuotedPrintable(data.to_string()))?;
                result.push(byte);
                i += 3;
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    Ok(result)
}
