//! Single address parsing, including recovery of addresses that were
//! duplicated inside a broken display name.

use chumsky::prelude::*;
use log::{debug, trace};

use super::encoded_word::decode_encoded_words;
use super::grammar::{chain_prefix, Located, RawAddrSpec, RawName};
use super::sanitize::sanitize;
use super::{ParseError, ParsedAddress};

/// Parse exactly one address with an optional display name.
///
/// Anything left after the address, except whitespace, is an error; use
/// [`parse_address_list`](super::parse_address_list) for lists.
pub fn parse_address(address: &str) -> Result<ParsedAddress, ParseError> {
    let sanitized = sanitize(address);
    if sanitized.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let chain = chain_prefix()
        .parse(sanitized.as_str())
        .into_result()
        .map_err(|errors| {
            trace!("No mailbox at start of {:?}: {:?}", sanitized, errors);
            ParseError::GrammarMismatch(sanitized.clone())
        })?;
    let (parsed, end) = resolve_chain(&sanitized, &chain)?;
    let remainder = sanitized[end..].trim();
    if !remainder.is_empty() {
        return Err(ParseError::TrailingGarbage {
            remainder: remainder.to_string(),
            input: address.to_string(),
        });
    }
    Ok(parsed)
}

/// Turn a matched chain into one address and the offset where it ends.
///
/// The first mailbox is the candidate. A follower that resolves without a
/// name of its own replaces its address and extends the match. This
/// recovers inputs like `"\"Name\" <fake@x.com>" <real@x.com>`, where the
/// first `<...>` pair belongs to the mangled display name. An empty chain
/// means nothing matched at the start of `text`.
pub(crate) fn resolve_chain(
    text: &str,
    chain: &[Located<'_>],
) -> Result<(ParsedAddress, usize), ParseError> {
    match chain.split_first() {
        Some((first, followers)) => resolve(first, followers),
        None => Err(ParseError::GrammarMismatch(text.to_string())),
    }
}

fn resolve(
    first: &Located<'_>,
    followers: &[Located<'_>],
) -> Result<(ParsedAddress, usize), ParseError> {
    trace!("Matched mailbox {:?}", first.mailbox);
    let mut name = match first.mailbox.name {
        Some(raw) => clean_name(raw)?,
        None => String::new(),
    };
    let mut address = normalize_addr_spec(first.mailbox.addr);
    let mut end = first.end;

    if let Some((next, rest)) = followers.split_first() {
        match resolve(next, rest) {
            Ok((right, right_end)) if !right.has_name() => {
                debug!(
                    "Replacing address {} with {} that follows it",
                    address,
                    right.address()
                );
                let (_, right_address) = right.into_parts();
                address = right_address;
                end = right_end;
            }
            Ok((right, _)) => {
                trace!("Keeping {}, {} has its own name", address, right.address());
            }
            Err(err) => {
                trace!("Keeping {}: {}", address, err);
            }
        }
    }

    if name == address {
        name.clear();
    }
    Ok((ParsedAddress::new(name, address), end))
}

/// Decode encoded words, drop quotes and backslashes, trim.
fn clean_name(raw: RawName<'_>) -> Result<String, ParseError> {
    let decoded = decode_encoded_words(raw.text).map_err(|source| {
        ParseError::EncodedWordDecodeFailure {
            name: raw.text.to_string(),
            source,
        }
    })?;
    let cleaned: String = decoded
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .map(|c| if c == '\t' { ' ' } else { c })
        .collect();
    Ok(cleaned.trim().to_string())
}

/// Lower-case both parts. A quoted local part like `"John Doe"` becomes
/// `john.doe`.
fn normalize_addr_spec(addr: RawAddrSpec<'_>) -> String {
    let local: String = addr
        .local
        .to_lowercase()
        .chars()
        .filter(|c| *c != '"')
        .map(|c| if c == ' ' || c == ',' { '.' } else { c })
        .collect();
    format!("{}@{}", local, addr.domain.to_lowercase())
}
