//! Media URL helpers shared by the Reddit provider and the media cache.
//!
//! Some Reddit CDN hosts serve signed preview URLs that expire or refuse
//! hot-linking. Those hosts are rejected outright, and `preview.redd.it`
//! links are rewritten to their `i.redd.it` direct form.

use url::Url;

/// Hosts whose media URLs are known to be broken for direct download.
const BLOCKED_HOSTS: &[&str] = &["external-preview.redd.it", "external-i.redd.it"];

/// File extensions the display layer can render.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Extension used when none can be inferred from the URL.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Returns `false` for URLs on a blocklisted CDN host.
///
/// Unparseable strings are checked by substring so that a malformed URL on
/// a blocked host is still rejected.
pub fn is_valid_media_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => !BLOCKED_HOSTS.contains(&host.to_lowercase().as_str()),
            None => false,
        },
        Err(_) => BLOCKED_HOSTS.iter().all(|host| !raw.contains(host)),
    }
}

/// Rewrite `preview.redd.it` URLs to their direct `i.redd.it` form.
///
/// The query string (signature and sizing parameters) is dropped and
/// `.jpg` is appended when the path has no image extension. Any other URL is
/// returned unchanged.
///
/// ```
/// use meme_search::media_url::canonicalize_media_url;
///
/// let direct = canonicalize_media_url("https://preview.redd.it/abc123.png?width=640&s=xyz");
/// assert_eq!(direct, "https://i.redd.it/abc123.png");
/// ```
pub fn canonicalize_media_url(raw: &str) -> String {
    if !raw.contains("preview.redd.it") || raw.contains("external-preview.redd.it") {
        return raw.to_owned();
    }
    let without_query = raw.split('?').next().unwrap_or(raw);
    let mut direct = without_query.replacen("preview.redd.it", "i.redd.it", 1);
    if extension_of(&direct).is_none() {
        direct.push('.');
        direct.push_str(DEFAULT_EXTENSION);
    }
    direct
}

/// Returns the lowercase image extension of a URL path, if it has a known one.
pub fn extension_of(raw: &str) -> Option<String> {
    let path = match Url::parse(raw) {
        Ok(parsed) => parsed.path().to_owned(),
        Err(_) => raw.split(['?', '#']).next().unwrap_or(raw).to_owned(),
    };
    let file = path.rsplit('/').next().unwrap_or(&path);
    let (_, ext) = file.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Returns `true` when the URL path ends in a renderable image extension.
pub fn is_image_url(raw: &str) -> bool {
    extension_of(raw).is_some()
}

/// Decode the HTML entities Reddit's JSON API leaves in preview URLs.
pub fn unescape_html_url(raw: &str) -> String {
    raw.replace("&amp;", "&")
}
