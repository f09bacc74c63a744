// course_site/site_server/src/links.rs

use axum::http::StatusCode;
use thiserror::Error;
use workbench_core::LinkKind;

pub struct LinkRecord {
    pub id: i64,
    pub web3: &'static str,
    pub documentation: &'static str,
}

impl LinkRecord {
    pub fn url(&self, kind: LinkKind) -> &'static str {
        match kind {
            LinkKind::Web3 => self.web3,
            LinkKind::Documentation => self.documentation,
        }
    }
}

pub const LINKS: [LinkRecord; 3] = [
    LinkRecord {
        id: 0,
        web3: "https://example.com/web3/post-0",
        documentation: "https://docs.example.com/post-0",
    },
    LinkRecord {
        id: 1,
        web3: "https://example.com/web3/post-1",
        documentation: "https://docs.example.com/post-1",
    },
    LinkRecord {
        id: 2,
        web3: "https://example.com/web3/post-2",
        documentation: "https://docs.example.com/post-2",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Missing id or type parameter")]
    MissingParameter,
    #[error("Link not found")]
    NotFound,
    #[error("Invalid type parameter")]
    InvalidType,
}

impl LinkError {
    pub fn status(self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::InvalidType => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Reads the leading integer of `raw` the way a lenient web client does:
/// leading whitespace, an optional sign, then digits up to the first other
/// character. `"1abc"` and `"1.5"` both read as 1.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let sign_len = raw.len() - unsigned.len();
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    raw[..sign_len + digits].parse().ok()
}

/// Resolves a writeup link from raw query values.
///
/// The record is looked up before `kind` is validated, so an unknown id
/// reports 404 even when the type is also bad. An id without a leading
/// integer matches nothing.
pub fn lookup(id: Option<&str>, kind: Option<&str>) -> Result<&'static str, LinkError> {
    let (Some(id), Some(kind)) = (id, kind) else {
        return Err(LinkError::MissingParameter);
    };
    let record = leading_integer(id)
        .and_then(|id| LINKS.iter().find(|link| link.id == id))
        .ok_or(LinkError::NotFound)?;
    let kind: LinkKind = kind.parse().map_err(|_| LinkError::InvalidType)?;
    Ok(record.url(kind))
}
