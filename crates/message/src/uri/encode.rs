//! Character classes of [RFC 3986](https://www.rfc-editor.org/rfc/rfc3986#section-2) and
//! the per-component percent-encoding rules built on them.

use crate::error::UriError;

/// A URI component that carries its own set of allowed characters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Component {
    /// The user part of user-info, where `:` separates the password and must be encoded.
    User,
    UserInfo,
    Host,
    Path,
    Query,
    Fragment,
}

impl Component {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Component::User | Component::UserInfo => "user-info",
            Component::Host => "host",
            Component::Path => "path",
            Component::Query => "query",
            Component::Fragment => "fragment",
        }
    }

    /// Whether `b` may appear literally in this component.
    pub(crate) fn allows(self, b: u8) -> bool {
        match self {
            Component::User => is_unreserved(b) || is_sub_delim(b),
            Component::UserInfo => is_unreserved(b) || is_sub_delim(b) || b == b':',
            Component::Host => is_unreserved(b) || is_sub_delim(b),
            Component::Path => is_pchar(b) || b == b'/',
            Component::Query | Component::Fragment => is_pchar(b) || b == b'/' || b == b'?',
        }
    }
}

#[inline]
pub(crate) fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

#[inline]
pub(crate) fn is_sub_delim(b: u8) -> bool {
    matches!(b, b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
}

#[inline]
fn is_pchar(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || matches!(b, b':' | b'@')
}

#[inline]
pub(crate) fn is_scheme_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

/// Returns `true` if `input[i..]` starts with a complete `%XX` triplet.
#[inline]
fn is_pct_triplet(input: &[u8], i: usize) -> bool {
    input.len() > i + 2 && input[i] == b'%' && input[i + 1].is_ascii_hexdigit() && input[i + 2].is_ascii_hexdigit()
}

/// Checks that every character of `input` is allowed in `component`, or part of a valid
/// percent-encoded triplet.
pub(crate) fn validate(input: &str, component: Component) -> Result<(), UriError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            if !is_pct_triplet(bytes, i) {
                return Err(UriError::MalformedPercentEncoding { component: component.name() });
            }
            i += 3;
            continue;
        }
        if !component.allows(b) {
            let ch = input[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(UriError::InvalidChar { component: component.name(), ch });
        }
        i += 1;
    }
    Ok(())
}

/// Percent-encodes every byte of `input` that may not appear literally in `component`.
///
/// Existing `%XX` triplets are kept as they are, a lone `%` is encoded as `%25`.
pub(crate) fn encode(input: &str, component: Component) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        if component.allows(b) || (b == b'%' && is_pct_triplet(bytes, i)) {
            out.push(char::from(b));
        } else {
            out.push('%');
            out.push(char::from(HEX[usize::from(b >> 4)]));
            out.push(char::from(HEX[usize::from(b & 0x0f)]));
        }
    }
    out
}
