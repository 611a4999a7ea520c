//! Address headers of a raw message.
//!
//! Fields are borrowed from the message with their folding intact. The
//! address parsers sanitize every value anyway, which turns each folding
//! line break into plain spaces, so values go to them unmodified.

use log::{debug, trace};

use super::list::parse_address_list;
use super::sanitize::sanitize;
use super::{ParseError, ParsedAddress};

/// Header fields whose values are address lists.
pub const ADDRESS_HEADERS: [&str; 6] = ["From", "Sender", "Reply-To", "To", "Cc", "Bcc"];

/// One header field as it appears in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField<'a> {
    pub name: &'a str,
    /// Everything after the `:`, continuation lines and line breaks included.
    pub value: &'a str,
}

impl HeaderField<'_> {
    pub fn is_address_header(&self) -> bool {
        ADDRESS_HEADERS
            .iter()
            .any(|header| self.name.eq_ignore_ascii_case(header))
    }

    /// The value on a single line, as the address parsers see it.
    pub fn unfolded(&self) -> String {
        sanitize(self.value)
    }
}

/// Address headers with their parsed lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressHeader {
    pub name: String,
    pub addresses: Vec<ParsedAddress>,
}

/// Iterator over the fields of a header section, see [`header_fields`].
#[derive(Debug, Clone)]
pub struct HeaderFields<'a> {
    rest: &'a str,
}

/// Fields of the header section of `message`, which ends at the first blank
/// line. Lines that neither start a field nor continue one are skipped.
pub fn header_fields(message: &str) -> HeaderFields<'_> {
    HeaderFields { rest: message }
}

impl<'a> Iterator for HeaderFields<'a> {
    type Item = HeaderField<'a>;

    fn next(&mut self) -> Option<HeaderField<'a>> {
        while !self.rest.is_empty() {
            let text = self.rest;
            let first_end = line_end(text, 0);
            let first = &text[..first_end];
            if first.trim().is_empty() {
                break;
            }

            let mut end = first_end;
            while end < text.len() && is_continuation(&text[end..line_end(text, end)]) {
                end = line_end(text, end);
            }
            self.rest = &text[end..];

            if is_continuation(first) {
                trace!("Skipping continuation line without a field");
                continue;
            }
            match first.split_once(':') {
                Some((name, _)) => {
                    return Some(HeaderField {
                        name: name.trim(),
                        value: &text[name.len() + 1..end],
                    })
                }
                None => trace!("Skipping header line without ':'"),
            }
        }
        self.rest = "";
        None
    }
}

/// Offset just past the line that starts at `start`, line break included.
fn line_end(text: &str, start: usize) -> usize {
    text[start..].find('\n').map_or(text.len(), |i| start + i + 1)
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !line.trim().is_empty()
}

/// Unfolded values of every field called `name`, ignoring case.
pub fn header_values<'a>(message: &'a str, name: &'a str) -> impl Iterator<Item = String> + 'a {
    header_fields(message)
        .filter(move |field| field.name.eq_ignore_ascii_case(name))
        .map(|field| field.unfolded())
}

/// Parse every address header of a raw message, in message order.
///
/// Fails on the first header whose address list does not parse.
pub fn parse_address_headers(message: &str) -> Result<Vec<AddressHeader>, ParseError> {
    header_fields(message)
        .filter(HeaderField::is_address_header)
        .map(|field| {
            debug!("Parsing addresses of {} header", field.name);
            Ok(AddressHeader {
                name: field.name.to_string(),
                addresses: parse_address_list(field.value)?,
            })
        })
        .collect()
}
