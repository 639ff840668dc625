use edgeproxy_errors::{ProxyError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Split a comma separated list, trimming blanks and dropping empty items.
pub fn split_comma_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merge `extra` into `base`, keeping first-seen order and dropping duplicates.
pub fn merge_unique(base: &[&str], extra: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(base.len() + extra.len());
    for item in base.iter().map(|s| s.to_string()).chain(extra.iter().cloned()) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Join a base URL and path segments with exactly one `/` between parts.
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for seg in segments {
        let seg = seg.trim_matches('/');
        if seg.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(seg);
    }
    url
}

// RFC 3986 unreserved characters stay as they are.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one URL path segment, so `/`, `?` and `#` in a name
/// cannot change the target of a request.
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Owner applied to an installed file. Needs privileges to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

/// Write `contents` to `folder/file_name` with the given unix mode,
/// creating the folder if needed. Existing files are overwritten and
/// re-permissioned.
pub fn install_file(
    folder: &Path,
    file_name: &str,
    contents: &[u8],
    mode: u32,
    owner: Option<FileOwner>,
) -> Result<PathBuf> {
    fs::create_dir_all(folder).map_err(|e| ProxyError::io(folder.display().to_string(), e))?;
    let target = folder.join(file_name);
    let shown = target.display().to_string();

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    let mut file = opts.open(&target).map_err(|e| ProxyError::io(&shown, e))?;
    file.write_all(contents).map_err(|e| ProxyError::io(&shown, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // mode on open() only applies to newly created files
        fs::set_permissions(&target, fs::Permissions::from_mode(mode))
            .map_err(|e| ProxyError::io(&shown, e))?;
        if let Some(o) = owner {
            std::os::unix::fs::chown(&target, Some(o.uid), Some(o.gid))
                .map_err(|e| ProxyError::io(&shown, e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = (mode, owner);

    Ok(target)
}
