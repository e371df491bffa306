use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped when converting an IRI path to its URI form.
///
/// Alphanumerics are never escaped; this strips the RFC 3986 unreserved and
/// reserved punctuation back out of `NON_ALPHANUMERIC`. `%` stays verbatim so
/// input that already carries percent-escapes is stable under
/// re-normalization.
const IRI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/')
    .remove(b'#')
    .remove(b'%')
    .remove(b'[')
    .remove(b']')
    .remove(b'=')
    .remove(b':')
    .remove(b';')
    .remove(b'$')
    .remove(b'&')
    .remove(b'(')
    .remove(b')')
    .remove(b'+')
    .remove(b',')
    .remove(b'!')
    .remove(b'?')
    .remove(b'*')
    .remove(b'@')
    .remove(b'\'');

/// Convert an IRI path (possibly containing literal Unicode) to its
/// percent-encoded URI form.
///
/// Applied uniformly to scope prefixes at construction time and to request
/// paths at authorization time, so prefix matching is encoding-agnostic:
/// `/tést` and `/t%C3%A9st` normalize to the same string.
pub fn iri_to_uri(path: &str) -> String {
    utf8_percent_encode(path, IRI_ESCAPE).to_string()
}
