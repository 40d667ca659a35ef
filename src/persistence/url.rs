//! Storage URL helpers
//!
//! Public and signed object URLs look like
//! `https://<host>/storage/v1/object/{public|sign}/<bucket>/<path>[?query]`.
//! URLs pasted around the page sometimes end up nested inside each other,
//! so every lookup takes the last (innermost) match.

use serde::{Deserialize, Serialize};

const OBJECT_PREFIX: &str = "/storage/v1/object/";
const KINDS: [&str; 2] = ["public/", "sign/"];

/// Bucket and object path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub bucket: String,
    pub path: String,
}

pub fn public_url(base: &str, key: &StorageKey) -> String {
    format!(
        "{}{}public/{}/{}",
        base.trim_end_matches('/'),
        OBJECT_PREFIX,
        key.bucket,
        key.path
    )
}

pub fn signed_url(base: &str, key: &StorageKey, token: &str) -> String {
    format!(
        "{}{}sign/{}/{}?token={}",
        base.trim_end_matches('/'),
        OBJECT_PREFIX,
        key.bucket,
        key.path,
        token
    )
}

struct Match {
    /// Start of `http(s)://host`, when present
    origin: Option<usize>,
    end: usize,
    key: StorageKey,
}

/// Start of an `http://host` or `https://host` that ends exactly at `at`
fn origin_before(s: &str, at: usize) -> Option<usize> {
    let head = &s[..at];
    let sep = head.rfind("://")?;
    let host = &head[sep + 3..];
    if host.is_empty() || host.contains('/') {
        return None;
    }
    let scheme = &head[..sep];
    if scheme.ends_with("https") {
        Some(sep - 5)
    } else if scheme.ends_with("http") {
        Some(sep - 4)
    } else {
        None
    }
}

/// Parse `<kind>/<bucket>/<path>` right after the prefix at `at`
fn parse_at(s: &str, at: usize) -> Option<(usize, StorageKey)> {
    let rest = &s[at + OBJECT_PREFIX.len()..];
    let kind = KINDS.iter().find(|k| rest.starts_with(*k))?;
    let rest = &rest[kind.len()..];
    let slash = rest.find('/')?;
    let bucket = &rest[..slash];
    if bucket.is_empty() {
        return None;
    }
    let path_and_tail = &rest[slash + 1..];
    let path_len = path_and_tail.find(['?', '#']).unwrap_or(path_and_tail.len());
    if path_len == 0 {
        return None;
    }
    let consumed = OBJECT_PREFIX.len() + kind.len() + slash + 1 + path_len;
    Some((
        at + consumed,
        StorageKey {
            bucket: bucket.to_string(),
            path: path_and_tail[..path_len].to_string(),
        },
    ))
}

/// Non-overlapping matches, left to right. A match's path swallows any
/// nested URL up to the first `?` or `#`.
fn scan(s: &str, require_origin: bool) -> Vec<Match> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = s[pos..].find(OBJECT_PREFIX) {
        let at = pos + offset;
        let origin = origin_before(s, at);
        match parse_at(s, at) {
            Some((end, key)) if origin.is_some() || !require_origin => {
                found.push(Match { origin, end, key });
                pos = end;
            }
            _ => pos = at + 1,
        }
    }
    found
}

/// Bucket and path of the innermost storage URL in `url`
pub fn extract_storage_key(url: &str) -> Option<StorageKey> {
    let outer = scan(url, false).pop()?.key;
    // The path itself may still hold another URL
    match scan(&outer.path, false).pop() {
        Some(inner) => Some(inner.key),
        None => Some(outer),
    }
}

/// The last complete storage URL in `url` (without its query), or `url`
/// unchanged when there is none
pub fn normalize_storage_url(url: &str) -> String {
    match scan(url, true).pop() {
        Some(Match {
            origin: Some(start),
            end,
            ..
        }) => url[start..end].to_string(),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "https://abc.supabase.co";

    fn key(bucket: &str, path: &str) -> StorageKey {
        StorageKey {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    #[test]
    fn test_round_trip_public() {
        let k = key("images", "1700-abc.png");
        let url = public_url(&format!("{}/", HOST), &k);
        assert_eq!(url, "https://abc.supabase.co/storage/v1/object/public/images/1700-abc.png");
        assert_eq!(extract_storage_key(&url), Some(k));
    }

    #[test]
    fn test_signed_url_query_is_dropped() {
        let url = signed_url(HOST, &key("images", "dir/a.png"), "tok");
        assert_eq!(extract_storage_key(&url), Some(key("images", "dir/a.png")));
        assert_eq!(
            normalize_storage_url(&url),
            "https://abc.supabase.co/storage/v1/object/sign/images/dir/a.png"
        );
    }

    #[test]
    fn test_nested_url_takes_innermost() {
        let inner = public_url(HOST, &key("images", "b.png"));
        let nested = format!("{}/storage/v1/object/public/wrong/{}", HOST, inner);
        assert_eq!(extract_storage_key(&nested), Some(key("images", "b.png")));
    }

    #[test]
    fn test_last_of_several() {
        let a = public_url(HOST, &key("one", "a.png"));
        let b = signed_url("http://other.host", &key("two", "b.png"), "t");
        let joined = format!("{} {}", a.replace("a.png", "a.png?x=1"), b);
        assert_eq!(extract_storage_key(&joined), Some(key("two", "b.png")));
        assert_eq!(
            normalize_storage_url(&joined),
            "http://other.host/storage/v1/object/sign/two/b.png"
        );
    }

    #[test]
    fn test_non_storage_urls() {
        assert_eq!(extract_storage_key("https://example.com/cat.png"), None);
        assert_eq!(extract_storage_key("/storage/v1/object/private/x/y"), None);
        assert_eq!(normalize_storage_url("blob:abc"), "blob:abc");
        // Relative storage paths have a key but nothing to normalize to
        let relative = "/storage/v1/object/public/images/a.png";
        assert_eq!(extract_storage_key(relative), Some(key("images", "a.png")));
        assert_eq!(normalize_storage_url(relative), relative);
    }
}
