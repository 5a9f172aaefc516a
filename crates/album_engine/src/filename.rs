use std::collections::HashSet;

use album_core::ResourceUrl;

const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 5;

/// A URL paired with its stable 1-based index and local file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    pub index: usize,
    pub url: ResourceUrl,
    pub filename: String,
}

/// Numbers the URL set from 1 in the order given, dropping repeats.
///
/// Callers pass checkpoint order. The checkpoint is append-only, so a URL keeps
/// its index across runs and URLs found by a later run always get trailing indices.
pub fn assign_filenames<'a, I>(urls: I) -> Vec<NamedResource>
where
    I: IntoIterator<Item = &'a ResourceUrl>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(*url))
        .enumerate()
        .map(|(i, url)| NamedResource {
            index: i + 1,
            filename: indexed_filename(i + 1, url.as_str()),
            url: url.clone(),
        })
        .collect()
}

/// `{index:04}.{ext}`, e.g. `0007.jpg`. Indices past 9999 simply get more digits,
/// so an existing name never changes when the album grows.
pub fn indexed_filename(index: usize, url: &str) -> String {
    format!("{index:04}.{}", file_extension(url))
}

/// Extension of the URL path, lower-cased; `jpg` when missing or implausible.
pub fn file_extension(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_comes_from_path_not_query() {
        assert_eq!(file_extension("https://sun9-1.userapi.com/impg/abc/x.JPG?size=1280x960&quality=95"), "jpg");
        assert_eq!(file_extension("https://i.example/a/b.png"), "png");
        assert_eq!(file_extension("https://i.example/a/b.webp#frag"), "webp");
        assert_eq!(file_extension("https://i.example/a/noext"), "jpg");
        assert_eq!(file_extension("https://i.example/a/.hidden"), "jpg");
        assert_eq!(file_extension("https://i.example/a/b.php-script"), "jpg");
    }

    #[test]
    fn padding_is_fixed_so_names_never_change() {
        assert_eq!(indexed_filename(7, "https://i/a.png"), "0007.png");
        assert_eq!(indexed_filename(9999, "https://i/a.jpg"), "9999.jpg");
        assert_eq!(indexed_filename(10_000, "https://i/a.jpg"), "10000.jpg");
    }

    #[test]
    fn indices_follow_input_order_and_skip_repeats() {
        let a = ResourceUrl::new("https://i/a.jpg").unwrap();
        let b = ResourceUrl::new("https://i/b.jpg").unwrap();
        let c = ResourceUrl::new("https://i/c.jpg").unwrap();
        let named = assign_filenames([&c, &a, &c, &b]);
        let order: Vec<(&str, &str)> = named
            .iter()
            .map(|n| (n.url.as_str(), n.filename.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("https://i/c.jpg", "0001.jpg"),
                ("https://i/a.jpg", "0002.jpg"),
                ("https://i/b.jpg", "0003.jpg"),
            ]
        );
    }
}
