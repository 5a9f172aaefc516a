use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

const ALBUM_MARKER: &str = "album";
const MOBILE_HOST_PREFIX: &str = "m.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlbumRefError {
    #[error("album reference is empty")]
    Empty,
    #[error("no album id found in {0:?}")]
    MissingAlbumId(String),
}

/// Identifies one remote album: `album<owner>_<album>`, owner negative for communities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlbumRef {
    owner_id: i64,
    album_id: u64,
}

impl AlbumRef {
    pub fn new(owner_id: i64, album_id: u64) -> Self {
        Self { owner_id, album_id }
    }

    /// Accepts desktop links, mobile (`m.`) links, `?z=album..` query links and bare
    /// `album-1_2` tokens.
    pub fn parse(input: &str) -> Result<Self, AlbumRefError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AlbumRefError::Empty);
        }

        if let Ok(url) = Url::parse(trimmed) {
            if let Some(found) = find_album_token(url.path()) {
                return Ok(found);
            }
            // Overlay links keep the album in the query, e.g. `/photos?z=album-1_2`.
            for (_, value) in url.query_pairs() {
                if let Some(found) = find_album_token(&value) {
                    return Ok(found);
                }
            }
            return Err(AlbumRefError::MissingAlbumId(trimmed.to_string()));
        }

        find_album_token(trimmed).ok_or_else(|| AlbumRefError::MissingAlbumId(trimmed.to_string()))
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn album_id(&self) -> u64 {
        self.album_id
    }

    /// Canonical desktop page of the album under `site_base`; also the listing endpoint
    /// and the referer for every request.
    pub fn page_url(&self, site_base: &str) -> String {
        format!("{}/{}", desktop_base(site_base), self)
    }

    /// Default run directory name, `album_<owner>_<album>`.
    pub fn run_dir_name(&self) -> String {
        format!("album_{}_{}", self.owner_id, self.album_id)
    }
}

impl fmt::Display for AlbumRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ALBUM_MARKER}{}_{}", self.owner_id, self.album_id)
    }
}

impl FromStr for AlbumRef {
    type Err = AlbumRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn find_album_token(haystack: &str) -> Option<AlbumRef> {
    haystack
        .match_indices(ALBUM_MARKER)
        .find_map(|(idx, _)| parse_ids(&haystack[idx + ALBUM_MARKER.len()..]))
}

fn parse_ids(rest: &str) -> Option<AlbumRef> {
    let (owner_part, tail) = rest.split_once('_')?;
    let owner_digits = owner_part.strip_prefix('-').unwrap_or(owner_part);
    if owner_digits.is_empty() || !owner_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let owner_id: i64 = owner_part.parse().ok()?;

    let album_digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    if album_digits.is_empty() {
        return None;
    }
    let album_id: u64 = album_digits.parse().ok()?;
    Some(AlbumRef::new(owner_id, album_id))
}

fn desktop_base(site_base: &str) -> String {
    let base = site_base.trim_end_matches('/');
    match Url::parse(base) {
        Ok(mut url) => {
            if let Some(host) = url.host_str() {
                if let Some(desktop) = host.strip_prefix(MOBILE_HOST_PREFIX) {
                    let desktop = desktop.to_string();
                    if url.set_host(Some(&desktop)).is_err() {
                        return base.to_string();
                    }
                }
            }
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => base.to_string(),
    }
}
