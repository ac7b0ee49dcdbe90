//! Recognising links that point at Matrix entities.
//!
//! Two forms are in use: `https://matrix.to/#/<id>[/<event>]` and the
//! `matrix:` URI scheme (`matrix:u/…`, `matrix:r/…`, `matrix:roomid/…`).
//! Both are normalised back to sigil form (`@user:hs`, `#alias:hs`,
//! `!room:hs`, `$event`).

const MATRIX_TO_PREFIXES: [&str; 2] = ["https://matrix.to/#/", "http://matrix.to/#/"];
const MATRIX_SCHEME: &str = "matrix:";

/// An entity reference extracted from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixUri {
    /// The primary identifier, with its sigil.
    pub identifier: String,
    /// The event the link points at, for permalinks.
    pub event_id: Option<String>,
}

/// Parses `href` as a Matrix entity link. Returns `None` for other links.
pub fn parse_matrix_uri(href: &str) -> Option<MatrixUri> {
    if let Some(rest) = MATRIX_TO_PREFIXES
        .iter()
        .find_map(|prefix| href.strip_prefix(prefix))
    {
        return parse_matrix_to(rest);
    }
    href.strip_prefix(MATRIX_SCHEME).and_then(parse_matrix_scheme)
}

fn parse_matrix_to(fragment: &str) -> Option<MatrixUri> {
    let path = strip_query(fragment);
    let mut parts = path.split('/');
    let identifier = decode(parts.next()?)?;
    if identifier.is_empty() {
        return None;
    }
    let event_id = match parts.next() {
        Some(event) if !event.is_empty() => Some(decode(event)?),
        _ => None,
    };
    Some(MatrixUri {
        identifier,
        event_id,
    })
}

fn parse_matrix_scheme(rest: &str) -> Option<MatrixUri> {
    let path = strip_query(rest);
    let mut parts = path.split('/');
    let sigil = match parts.next()? {
        "u" => '@',
        "r" => '#',
        "roomid" => '!',
        _ => return None,
    };
    let id = decode(parts.next()?)?;
    if id.is_empty() {
        return None;
    }
    let event_id = match (parts.next(), parts.next()) {
        (Some("e"), Some(event)) if !event.is_empty() => Some(format!("${}", decode(event)?)),
        _ => None,
    };
    Some(MatrixUri {
        identifier: format!("{sigil}{id}"),
        event_id,
    })
}

fn strip_query(s: &str) -> &str {
    s.split_once('?').map_or(s, |(path, _)| path)
}

fn decode(s: &str) -> Option<String> {
    urlencoding::decode(s).ok().map(|c| c.into_owned())
}
