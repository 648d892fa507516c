//! Header normalization between the invocation boundary and the wire.
//!
//! The invocation boundary carries one value per header name with
//! case-insensitive keys; the wire carries ordered (name, value) pairs that
//! may repeat. These functions convert between the two.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Header mapping as carried across the invocation boundary.
pub type HeaderMapping = BTreeMap<String, String>;

/// Headers where a repeated occurrence replaces the earlier one instead of
/// being comma-joined. Set-Cookie is included because folding cookies breaks
/// them (RFC 6265).
pub const SINGULAR_HEADERS: [&str; 18] = [
    "age",
    "authorization",
    "content-length",
    "content-type",
    "etag",
    "expires",
    "from",
    "host",
    "if-modified-since",
    "if-unmodified-since",
    "last-modified",
    "location",
    "max-forwards",
    "proxy-authorization",
    "referer",
    "retry-after",
    "user-agent",
    "set-cookie",
];

/// Headers managed by the invocation boundary itself.
pub const TRANSPORT_HEADERS: [&str; 2] = ["connection", "transfer-encoding"];

pub fn is_singular(name: &str) -> bool {
    SINGULAR_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Lower-case every key. On collision the later key in iteration order wins.
pub fn to_lower_keyed(headers: &HeaderMapping) -> HeaderMapping {
    headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.clone()))
        .collect()
}

/// Fold a raw wire sequence into a mapping keyed by lower-cased name.
///
/// Repeats of a singular header keep only the last value; repeats of any
/// other header are joined with `,` in arrival order.
pub fn raw_pairs_to_mapping<I, N, V>(pairs: I) -> HeaderMapping
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: Into<String>,
{
    let mut headers = HeaderMapping::new();

    for (name, value) in pairs {
        let value = value.into();
        match headers.entry(name.as_ref().to_lowercase()) {
            Entry::Occupied(mut existing) if !is_singular(existing.key()) => {
                let merged = existing.get_mut();
                merged.push(',');
                merged.push_str(&value);
            }
            Entry::Occupied(mut existing) => {
                existing.insert(value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    headers
}

/// Upper-case the first character of every hyphen-separated segment of each
/// key (`content-type` → `Content-Type`). Values are untouched.
pub fn capitalize(headers: HeaderMapping) -> HeaderMapping {
    headers
        .into_iter()
        .map(|(name, value)| (capitalize_name(&name), value))
        .collect()
}

fn capitalize_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Remove `connection` and `transfer-encoding`, whatever their case.
pub fn drop_transport_headers(headers: HeaderMapping) -> HeaderMapping {
    headers
        .into_iter()
        .filter(|(name, _)| {
            !TRANSPORT_HEADERS
                .iter()
                .any(|transport| transport.eq_ignore_ascii_case(name))
        })
        .collect()
}

/// Full response-side pipeline: fold, strip transport headers, capitalize.
pub fn response_headers<I, N, V>(pairs: I) -> HeaderMapping
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: Into<String>,
{
    capitalize(drop_transport_headers(raw_pairs_to_mapping(pairs)))
}
