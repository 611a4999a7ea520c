use chumsky::prelude::*;
use log::{debug, trace};

use super::grammar::list_prefix;
use super::mailbox::resolve_chain;
use super::sanitize::sanitize;
use super::{ParseError, ParsedAddress};

/// Recipient list values that stand for "nobody visible".
const PLACEHOLDER_LISTS: [&str; 2] = ["undisclosed-recipients", "undisclosed recipients"];

/// Whether a sanitized list is empty or an undisclosed recipients
/// placeholder, optionally written as an empty group (`...:;`).
pub fn is_placeholder_list(list: &str) -> bool {
    let list = list.trim_end_matches(';').trim_end();
    let list = list.strip_suffix(':').unwrap_or(list).trim_end();
    list.is_empty()
        || PLACEHOLDER_LISTS
            .iter()
            .any(|placeholder| list.eq_ignore_ascii_case(placeholder))
}

/// Parse a comma separated address list.
///
/// Empty input and undisclosed recipients placeholders yield an empty list.
/// A single malformed entry fails the whole list.
pub fn parse_address_list(list: &str) -> Result<Vec<ParsedAddress>, ParseError> {
    let sanitized = sanitize(list);
    let trimmed = sanitized.trim_end_matches(|c: char| c == ',' || c == ' ');
    if is_placeholder_list(trimmed) {
        debug!("Treating {:?} as an empty address list", list);
        return Ok(Vec::new());
    }

    let chains = list_prefix()
        .parse(trimmed)
        .into_result()
        .map_err(|errors| {
            trace!("No address list in {:?}: {:?}", trimmed, errors);
            ParseError::GrammarMismatch(trimmed.to_string())
        })?;

    // Chains line up with entries for as long as every entry ends in a
    // separator; the first entry without a chain failed to match.
    let mut addresses = Vec::with_capacity(chains.len());
    let mut entry = trimmed;
    let mut pending = chains.iter();
    loop {
        let chain = pending.next().map_or(&[][..], Vec::as_slice);
        let (address, end) = resolve_chain(entry, chain)?;
        addresses.push(address);

        let remainder = trimmed[end..].trim_start();
        if remainder.is_empty() {
            break;
        }
        let Some(next) = remainder.strip_prefix(',') else {
            return Err(ParseError::ListSeparatorExpected {
                remainder: remainder.to_string(),
                list: list.to_string(),
            });
        };
        entry = next.trim_start();
    }

    debug!("Parsed {} address(es) from list", addresses.len());
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(list: &[ParsedAddress]) -> Vec<&str> {
        list.iter().map(ParsedAddress::address).collect()
    }

    #[test]
    fn test_placeholders() {
        for list in [
            "",
            "   ",
            ", ,",
            "undisclosed-recipients",
            "Undisclosed Recipients",
            "undisclosed-recipients:;",
            "UNDISCLOSED RECIPIENTS:;",
            "undisclosed-recipients: ;",
            "undisclosed-recipients:",
            "\tundisclosed-recipients\r\n",
        ] {
            assert_eq!(parse_address_list(list), Ok(Vec::new()), "{list:?}");
        }
    }

    #[test]
    fn test_single_address() {
        let list = parse_address_list("Erik Unger <Erik@Domonda.com>").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name(), "Erik Unger");
        assert_eq!(list[0].address(), "erik@domonda.com");
    }

    #[test]
    fn test_mixed_list_keeps_order() {
        let list = parse_address_list(
            "\"Unger, Erik\" <erik@domonda.com>, b@example.com,Carl <C@Example.org>",
        )
        .unwrap();
        assert_eq!(
            addresses(&list),
            vec!["erik@domonda.com", "b@example.com", "c@example.org"]
        );
        assert_eq!(list[0].name(), "Unger, Erik");
        assert_eq!(list[1].name(), "");
        assert_eq!(list[2].name(), "Carl");
    }

    #[test]
    fn test_trailing_separators_ignored() {
        let list = parse_address_list("a@example.com, b@example.com, ,").unwrap();
        assert_eq!(addresses(&list), vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_folded_header_value() {
        let list = parse_address_list("a@example.com,\r\n\tB <b@example.com>").unwrap();
        assert_eq!(addresses(&list), vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_recovery_inside_list() {
        let list = parse_address_list(
            "\"\\\"Example\\\" <ar1@example.com>\" <ar@example.com>, other@example.com",
        )
        .unwrap();
        assert_eq!(addresses(&list), vec!["ar@example.com", "other@example.com"]);
        assert_eq!(list[0].name(), "Example");
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_address_list("\"A\" <a@example.com> \"B\" <b@example.com>").unwrap_err();
        assert_eq!(
            err,
            ParseError::ListSeparatorExpected {
                remainder: "\"B\" <b@example.com>".to_string(),
                list: "\"A\" <a@example.com> \"B\" <b@example.com>".to_string(),
            }
        );
    }

    #[test]
    fn test_one_bad_entry_fails_list() {
        assert_eq!(
            parse_address_list("a@example.com, Hello World!, b@example.com"),
            Err(ParseError::GrammarMismatch(
                "Hello World!, b@example.com".to_string()
            ))
        );
    }

    #[test]
    fn test_space_separated_run_fails_fast() {
        let list = "a@example.com ".repeat(20_000);
        assert!(matches!(
            parse_address_list(&list),
            Err(ParseError::ListSeparatorExpected { .. })
        ));
    }

    #[test]
    fn test_long_list() {
        let list = vec!["\"A, B\" <a@example.com>"; 20_000].join(", ");
        assert_eq!(parse_address_list(&list).unwrap().len(), 20_000);
    }

    #[test]
    fn test_empty_entry_fails_list() {
        assert!(parse_address_list("a@example.com,, b@example.com").is_err());
    }

    #[test]
    fn test_leading_comma_fails() {
        assert!(parse_address_list(",erik@domonda.com").is_err());
    }

    #[test]
    fn test_round_trip() {
        let list = parse_address_list(
            "\"Unger, Erik\" <Erik@Domonda.com>, b@example.com, =?utf-8?q?J=C3=BCrgen?= <jg@example.de>",
        )
        .unwrap();
        let joined = list
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        assert_eq!(parse_address_list(&joined).unwrap(), list);
    }
}
