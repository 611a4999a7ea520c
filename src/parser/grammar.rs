//! Permissive mailbox grammar built from chumsky combinators.
//!
//! The fragments are deliberately looser than RFC 5322:
//! - local parts accept accented Latin letters and loose dots
//! - quoted strings have no escapes, so a stray `\"` ends them early
//! - an unquoted display name is anything up to `<` that has no comma
//! - domains need at least two labels and an alphabetic top-level label
//!
//! Every fragment is exposed on its own so it can be tested in isolation;
//! [`chain_prefix`], [`list_prefix`] and [`addr_spec_prefix`] compose them
//! for the parsers.
//!
//! All choices are ordered and no fragment nests repetitions over overlapping
//! character classes, so a failing input is rejected after at most one
//! backtrack per alternative. Chains are capped at [`MAX_FOLLOWERS`] and a
//! whole list is matched in one pass, so the work stays linear in the input.

use chumsky::prelude::*;

/// Parser extra used by every fragment.
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Non-alphanumeric characters accepted unquoted in a local part.
const ATEXT_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

/// How the display name of a mailbox was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// `"Erik Unger" <...>`
    Quoted,
    /// `=?utf-8?q?...?= <...>`
    EncodedWord,
    /// `Erik Unger <...>`
    Unquoted,
}

/// Display name exactly as it appeared in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawName<'src> {
    pub kind: NameKind,
    /// Text without surrounding quotes for [`NameKind::Quoted`], otherwise
    /// everything up to the `<`.
    pub text: &'src str,
}

/// `local@domain` slices exactly as they appeared in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAddrSpec<'src> {
    pub local: &'src str,
    pub domain: &'src str,
}

/// One matched mailbox before any normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMailbox<'src> {
    pub name: Option<RawName<'src>>,
    pub addr: RawAddrSpec<'src>,
}

/// Accented Latin letters (Latin-1 Supplement, Extended-A and Extended-B),
/// without the multiplication and division signs.
pub fn is_latin_accented(c: char) -> bool {
    matches!(c, '\u{00C0}'..='\u{024F}') && c != '\u{00D7}' && c != '\u{00F7}'
}

/// atext extended with accented Latin letters.
pub fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(c) || is_latin_accented(c)
}

/// Characters that may appear in an unquoted local part, dots included.
pub fn is_local_char(c: char) -> bool {
    is_atext(c) || c == '.'
}

/// Characters of a single domain label.
pub fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || is_latin_accented(c)
}

/// Characters that may appear anywhere in a domain, dots included.
pub fn is_domain_char(c: char) -> bool {
    is_label_char(c) || c == '.'
}

fn wsp<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    one_of(" \t").repeated().labelled("WSP")
}

/// Double-quoted string without escape handling, yielding the inner text.
pub fn quoted_string<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    just('"')
        .ignore_then(none_of("\"").repeated().to_slice())
        .then_ignore(just('"'))
        .labelled("quoted-string")
}

/// One or more runs of atext and quoted strings, e.g. `erik.unger`,
/// `"John Doe"` or `john."doe"`. Yields the raw slice, quotes included.
pub fn local_part<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    let run = any()
        .filter(|c: &char| is_local_char(*c))
        .repeated()
        .at_least(1)
        .ignored();

    choice((quoted_string().ignored(), run))
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("local-part")
}

fn domain_label<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any()
        .filter(|c: &char| is_label_char(*c))
        .repeated()
        .at_least(1)
        .labelled("domain-label")
}

fn top_level_label<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphabetic())
        .repeated()
        .at_least(2)
        .labelled("top-level-label")
}

/// Lookahead after a `label "."` pair: another label must follow, either one
/// that continues with a dot or a valid top-level label.
fn domain_continuation<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    choice((
        domain_label()
            .then(just('.'))
            .then(any().filter(|c: &char| is_label_char(*c)))
            .ignored(),
        top_level_label(),
    ))
    .rewind()
}

/// At least two dot separated labels, the last one purely alphabetic.
///
/// Matching stops at the end of the top-level label, so `domonda.com1`
/// yields `domonda.com` and leaves `1` unconsumed, and a sentence-ending
/// dot is never taken as part of the domain.
pub fn domain_part<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    domain_label()
        .then_ignore(just('.'))
        .then_ignore(domain_continuation())
        .repeated()
        .at_least(1)
        .then(top_level_label())
        .to_slice()
        .labelled("domain")
}

/// `local-part "@" domain`
pub fn addr_spec<'src>() -> impl Parser<'src, &'src str, RawAddrSpec<'src>, Extra<'src>> + Clone
{
    local_part()
        .then_ignore(just('@'))
        .then(domain_part())
        .map(|(local, domain)| RawAddrSpec { local, domain })
        .labelled("addr-spec")
}

/// `"<" addr-spec ">"` with optional spaces inside the brackets.
pub fn angle_addr<'src>() -> impl Parser<'src, &'src str, RawAddrSpec<'src>, Extra<'src>> + Clone
{
    just('<')
        .ignore_then(wsp())
        .ignore_then(addr_spec())
        .then_ignore(wsp())
        .then_ignore(just('>'))
        .labelled("angle-addr")
}

/// A single RFC 2047 encoded word, `=?charset?encoding?data?=`.
pub fn encoded_word<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    just("=?")
        .then(none_of("? ").repeated().at_least(1))
        .then(just('?'))
        .then(one_of("bBqQ"))
        .then(just('?'))
        .then(none_of("? ").repeated())
        .then(just("?="))
        .to_slice()
        .labelled("encoded-word")
}

/// One or more encoded words separated by whitespace.
pub fn encoded_word_name<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone
{
    encoded_word()
        .then(
            one_of(" \t")
                .repeated()
                .at_least(1)
                .then(encoded_word())
                .repeated(),
        )
        .to_slice()
        .labelled("encoded-word-name")
}

/// Anything up to the next `<`, as long as it holds no comma.
pub fn unquoted_name<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    none_of("<,")
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("unquoted-name")
}

/// Mailbox with an optional display name:
///
/// ```text
/// mailbox = quoted-name [WSP] angle-addr
///         / encoded-word-name [WSP] angle-addr
///         / unquoted-name angle-addr
///         / angle-addr
///         / addr-spec
/// ```
pub fn mailbox<'src>() -> impl Parser<'src, &'src str, RawMailbox<'src>, Extra<'src>> + Clone {
    let named = |kind: NameKind| {
        move |(text, addr): (&'src str, RawAddrSpec<'src>)| RawMailbox {
            name: Some(RawName { kind, text }),
            addr,
        }
    };

    choice((
        quoted_name_addr().map(named(NameKind::Quoted)),
        encoded_word_name()
            .then_ignore(wsp())
            .then(angle_addr())
            .map(named(NameKind::EncodedWord)),
        unquoted_name()
            .then(angle_addr())
            .map(named(NameKind::Unquoted)),
        angle_addr().map(|addr| RawMailbox { name: None, addr }),
        addr_spec().map(|addr| RawMailbox { name: None, addr }),
    ))
    .labelled("mailbox")
}

fn quoted_name_addr<'src>(
) -> impl Parser<'src, &'src str, (&'src str, RawAddrSpec<'src>), Extra<'src>> + Clone {
    quoted_string().then_ignore(wsp()).then(angle_addr())
}

/// Followers of a mailbox that are tried as its real address.
pub const MAX_FOLLOWERS: usize = 4;

/// A matched mailbox and the byte offset just past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'src> {
    pub mailbox: RawMailbox<'src>,
    pub end: usize,
}

fn located_mailbox<'src>() -> impl Parser<'src, &'src str, Located<'src>, Extra<'src>> + Clone {
    mailbox().map_with(|mailbox, e| Located {
        mailbox,
        end: e.span().end,
    })
}

/// A mailbox and up to [`MAX_FOLLOWERS`] mailboxes that follow it with no
/// comma in between, e.g. `"Name <fake@x.com>" <real@x.com>`.
pub fn mailbox_chain<'src>(
) -> impl Parser<'src, &'src str, Vec<Located<'src>>, Extra<'src>> + Clone {
    wsp()
        .ignore_then(located_mailbox())
        .repeated()
        .at_least(1)
        .at_most(MAX_FOLLOWERS + 1)
        .collect::<Vec<_>>()
        .labelled("mailbox")
}

/// [`mailbox_chain`] matched against a prefix. Offsets point into the input.
pub fn chain_prefix<'src>(
) -> impl Parser<'src, &'src str, Vec<Located<'src>>, Extra<'src>> + Clone {
    mailbox_chain().then_ignore(any().repeated())
}

/// Comma separated chains, matched in a single pass over the input.
///
/// Stops before the first separator that is not followed by a chain; the
/// caller finds the unmatched rest through the offsets. Never fails.
pub fn list_prefix<'src>(
) -> impl Parser<'src, &'src str, Vec<Vec<Located<'src>>>, Extra<'src>> + Clone {
    mailbox_chain()
        .separated_by(wsp().then(just(',')).then(wsp()))
        .collect::<Vec<_>>()
        .then_ignore(any().repeated())
}

/// [`addr_spec`] matched against a prefix, yielding the matched slice.
pub fn addr_spec_prefix<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    addr_spec().to_slice().then_ignore(any().repeated())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full<'src, O>(
        parser: impl Parser<'src, &'src str, O, Extra<'src>>,
        input: &'src str,
    ) -> Option<O> {
        parser.then_ignore(end()).parse(input).into_result().ok()
    }

    #[test]
    fn test_quoted_string_inner_text() {
        assert_eq!(full(quoted_string(), "\"Erik Unger\""), Some("Erik Unger"));
        assert_eq!(full(quoted_string(), "\"\""), Some(""));
    }

    #[test]
    fn test_quoted_string_has_no_escapes() {
        assert_eq!(full(quoted_string(), "\"a\\\"b\""), None);
        assert_eq!(full(quoted_string(), "\"a\\\""), Some("a\\"));
    }

    #[test]
    fn test_local_part_atext() {
        assert_eq!(
            full(local_part(), "!#$%&'*+-/=?^_`{|}~"),
            Some("!#$%&'*+-/=?^_`{|}~")
        );
        assert_eq!(full(local_part(), "Erik.Unger"), Some("Erik.Unger"));
    }

    #[test]
    fn test_local_part_accented() {
        assert_eq!(full(local_part(), "jürgen.größ"), Some("jürgen.größ"));
        assert_eq!(full(local_part(), "a×b"), None);
    }

    #[test]
    fn test_local_part_loose_dots() {
        assert_eq!(full(local_part(), ".erik..unger."), Some(".erik..unger."));
    }

    #[test]
    fn test_local_part_quoted_and_mixed() {
        assert_eq!(full(local_part(), "\"John Doe\""), Some("\"John Doe\""));
        assert_eq!(full(local_part(), "john.\"doe\""), Some("john.\"doe\""));
    }

    #[test]
    fn test_local_part_rejects_empty_and_specials() {
        assert_eq!(full(local_part(), ""), None);
        assert_eq!(full(local_part(), "erik unger"), None);
        assert_eq!(full(local_part(), "erik,unger"), None);
        assert_eq!(full(local_part(), "erik@unger"), None);
    }

    #[test]
    fn test_domain_part() {
        assert_eq!(full(domain_part(), "domonda.com"), Some("domonda.com"));
        assert_eq!(full(domain_part(), "mail.my-host.co.uk"), Some("mail.my-host.co.uk"));
        assert_eq!(full(domain_part(), "müller.de"), Some("müller.de"));
    }

    #[test]
    fn test_domain_part_needs_two_labels() {
        assert_eq!(full(domain_part(), "localhost"), None);
    }

    #[test]
    fn test_domain_part_top_level_label() {
        assert_eq!(full(domain_part(), "domonda.c"), None);
        assert_eq!(full(domain_part(), "10.0.0.1"), None);
        assert_eq!(full(domain_part(), "domonda.c0m"), None);
    }

    #[test]
    fn test_domain_part_stops_after_top_level_label() {
        let parser = domain_part().then(any().repeated().to_slice());
        let (domain, rest) = parser.parse("domonda.com1").into_result().unwrap();
        assert_eq!(domain, "domonda.com");
        assert_eq!(rest, "1");

        let (domain, rest) = parser.parse("domonda.com.").into_result().unwrap();
        assert_eq!(domain, "domonda.com");
        assert_eq!(rest, ".");
    }

    #[test]
    fn test_addr_spec() {
        assert_eq!(
            full(addr_spec(), "Erik.Unger@Domonda.com"),
            Some(RawAddrSpec {
                local: "Erik.Unger",
                domain: "Domonda.com"
            })
        );
        assert_eq!(full(addr_spec(), "@domonda.com"), None);
        assert_eq!(full(addr_spec(), "erik@"), None);
    }

    #[test]
    fn test_angle_addr_allows_inner_spaces() {
        assert_eq!(
            full(angle_addr(), "< erik@domonda.com >"),
            Some(RawAddrSpec {
                local: "erik",
                domain: "domonda.com"
            })
        );
        assert_eq!(full(angle_addr(), "<erik@domonda.com"), None);
    }

    #[test]
    fn test_encoded_word() {
        assert_eq!(
            full(encoded_word(), "=?UTF-8?Q?J=C3=BCrgen?="),
            Some("=?UTF-8?Q?J=C3=BCrgen?=")
        );
        assert_eq!(full(encoded_word(), "=?UTF-8?X?abc?="), None);
        assert_eq!(full(encoded_word(), "=??Q?abc?="), None);
    }

    #[test]
    fn test_encoded_word_name_multiple_words() {
        let input = "=?utf-8?q?J=C3=BCrgen?= =?utf-8?q?_Gr=C3=B6=C3=9F?=";
        assert_eq!(full(encoded_word_name(), input), Some(input));
    }

    #[test]
    fn test_unquoted_name() {
        assert_eq!(full(unquoted_name(), "Erik Unger "), Some("Erik Unger "));
        assert_eq!(full(unquoted_name(), "Unger, Erik"), None);
        assert_eq!(full(unquoted_name(), ""), None);
    }

    #[test]
    fn test_mailbox_quoted_name() {
        let mailbox = full(mailbox(), "\"Erik Unger\" <erik@domonda.com>").unwrap();
        assert_eq!(
            mailbox.name,
            Some(RawName {
                kind: NameKind::Quoted,
                text: "Erik Unger"
            })
        );
        assert_eq!(mailbox.addr.local, "erik");
        assert_eq!(mailbox.addr.domain, "domonda.com");
    }

    #[test]
    fn test_mailbox_encoded_name() {
        let mailbox = full(mailbox(), "=?utf-8?q?Erik?= <erik@domonda.com>").unwrap();
        assert_eq!(
            mailbox.name,
            Some(RawName {
                kind: NameKind::EncodedWord,
                text: "=?utf-8?q?Erik?="
            })
        );
    }

    #[test]
    fn test_mailbox_unquoted_name() {
        let mailbox = full(mailbox(), "Erik Unger <Erik.Unger@Domonda.com>").unwrap();
        assert_eq!(
            mailbox.name,
            Some(RawName {
                kind: NameKind::Unquoted,
                text: "Erik Unger "
            })
        );
        assert_eq!(mailbox.addr.local, "Erik.Unger");
    }

    #[test]
    fn test_mailbox_without_name() {
        assert_eq!(full(mailbox(), "<erik@domonda.com>").unwrap().name, None);
        assert_eq!(full(mailbox(), "erik@domonda.com").unwrap().name, None);
    }

    fn chain(input: &str) -> Option<Vec<Located<'_>>> {
        chain_prefix().parse(input).into_result().ok()
    }

    #[test]
    fn test_mailbox_broken_quotes_fall_back_to_unquoted() {
        let input = "\"\\\"Example\\\" <ar1@example.com>\" <ar@example.com>";
        let links = chain(input).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].mailbox.name,
            Some(RawName {
                kind: NameKind::Unquoted,
                text: "\"\\\"Example\\\" "
            })
        );
        assert_eq!(links[0].mailbox.addr.local, "ar1");
        assert_eq!(&input[links[0].end..], "\" <ar@example.com>");
        assert_eq!(links[1].mailbox.addr.local, "ar");
        assert_eq!(links[1].end, input.len());
    }

    #[test]
    fn test_chain_stops_at_comma() {
        let input = "erik@domonda.com, Erik <erik@example.com>";
        let links = chain(input).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].mailbox.name, None);
        assert_eq!(links[0].mailbox.addr.local, "erik");
        assert_eq!(&input[links[0].end..], ", Erik <erik@example.com>");
    }

    #[test]
    fn test_chain_is_capped() {
        let input = "a@example.com ".repeat(MAX_FOLLOWERS + 3);
        let links = chain(&input).unwrap();
        assert_eq!(links.len(), MAX_FOLLOWERS + 1);
    }

    #[test]
    fn test_chain_rejects_garbage() {
        assert!(chain("Hello World!").is_none());
        assert!(chain("@domonda.com").is_none());
        assert!(chain(",erik@domonda.com").is_none());
        assert!(chain("").is_none());
    }

    #[test]
    fn test_list_prefix_splits_at_commas() {
        let input = "a@example.com b@example.com , \"B, C\" <c@example.com>,d@example.com";
        let chains = list_prefix().parse(input).into_result().unwrap();
        let lens: Vec<usize> = chains.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![2, 1, 1]);
        assert_eq!(chains[1][0].mailbox.addr.local, "c");
        assert_eq!(chains[2][0].end, input.len());
    }

    #[test]
    fn test_list_prefix_stops_before_bad_entry() {
        let input = "a@example.com, Hello World!";
        let chains = list_prefix().parse(input).into_result().unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(&input[chains[0][0].end..], ", Hello World!");
        assert!(list_prefix().parse("Hello").into_result().unwrap().is_empty());
    }

    #[test]
    fn test_addr_spec_prefix() {
        assert_eq!(
            addr_spec_prefix().parse("Erik@Domonda.com> and more").into_result().ok(),
            Some("Erik@Domonda.com")
        );
    }

    #[test]
    fn test_long_input_fails_fast() {
        let input = "a".repeat(20_000) + " <" + &".".repeat(20_000);
        assert!(chain(&input).is_none());
    }
}
