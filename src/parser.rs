use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod encoded_word;
pub mod find;
pub mod grammar;
pub mod headers;
pub mod list;
pub mod mailbox;
pub mod sanitize;

pub use encoded_word::{decode_encoded_words, EncodedWordError};
pub use find::find_all_addresses;
pub use headers::{
    header_fields, header_values, parse_address_headers, AddressHeader, HeaderField,
    HeaderFields, ADDRESS_HEADERS,
};
pub use list::{is_placeholder_list, parse_address_list};
pub use mailbox::parse_address;
pub use sanitize::sanitize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty address")]
    EmptyInput,
    #[error("can't parse email address from {0:?}")]
    GrammarMismatch(String),
    #[error("parsed address with unexpected remaining characters {remainder:?} from {input:?}")]
    TrailingGarbage { remainder: String, input: String },
    #[error("expected ',' but found {remainder:?} in address list {list:?}")]
    ListSeparatorExpected { remainder: String, list: String },
    #[error("can't decode encoded-word in name {name:?}: {source}")]
    EncodedWordDecodeFailure {
        name: String,
        #[source]
        source: EncodedWordError,
    },
}

/// A display name and a normalized `local@domain` address.
///
/// The address is lower-cased in both parts. The name is empty when the
/// input had none, or when it just repeated the address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParsedAddress {
    name: String,
    address: String,
}

impl ParsedAddress {
    pub(crate) fn new(name: String, address: String) -> Self {
        Self { name, address }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Everything before the last `@`.
    pub fn local_part(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or(self.address.as_str(), |(local, _)| local)
    }

    /// Everything after the last `@`.
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }

    /// Returns `(name, address)`.
    pub fn into_parts(self) -> (String, String) {
        (self.name, self.address)
    }
}

/// Formats as `address`, or `"name" <address>` when there is a name.
///
/// Names never hold `"` or `\`, the parsers strip both, so quoting needs no
/// escapes.
impl fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return f.write_str(&self.address);
        }
        write!(f, "\"{}\" <{}>", self.name, self.address)
    }
}

impl FromStr for ParsedAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}
