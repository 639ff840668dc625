use crate::helpers::tokens::FileOpener;
use edgeproxy_errors::{ProxyError, Result};
use edgeproxy_utils::install_file;
pub use edgeproxy_utils::FileOwner;
use rustls_pemfile::{certs as certsfn, read_one, Item};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn count_certificates(pem: &[u8], what: &str) -> Result<usize> {
    let mut reader = Cursor::new(pem);
    let certs = certsfn(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ProxyError::decode(what, e))?;
    Ok(certs.len())
}

pub fn has_private_key(pem: &[u8], what: &str) -> Result<bool> {
    let mut reader = Cursor::new(pem);
    loop {
        match read_one(&mut reader).map_err(|e| ProxyError::decode(what, e))? {
            Some(Item::Pkcs8Key(_)) | Some(Item::Pkcs1Key(_)) | Some(Item::Sec1Key(_)) => {
                return Ok(true);
            }
            Some(_) => continue, // skip unrelated PEM blocks
            None => return Ok(false),
        }
    }
}

/// At least one certificate and one private key, else an error naming the
/// offending file.
pub fn validate_pem_pair(cert: &[u8], cert_name: &str, key: &[u8], key_name: &str) -> Result<()> {
    if count_certificates(cert, cert_name)? == 0 {
        return Err(ProxyError::decode(cert_name, "no certificates found"));
    }
    if !has_private_key(key, key_name)? {
        return Err(ProxyError::decode(key_name, "no private key found"));
    }
    Ok(())
}

/// Destination of a locally installed TLS pair.
#[derive(Debug, Clone)]
pub struct TlsInstall {
    pub target_folder: PathBuf,
    pub cert_filename: String,
    pub key_filename: String,
    pub owner: Option<FileOwner>,
}

/// Validate `cert_path`/`key_path` and copy them into the target folder,
/// certificate 0644 and key 0600.
pub fn install_tls_pair(
    opener: &dyn FileOpener,
    cert_path: &Path,
    key_path: &Path,
    dest: &TlsInstall,
) -> Result<(PathBuf, PathBuf)> {
    let cert = opener.read(cert_path)?;
    let key = opener.read(key_path)?;
    validate_pem_pair(
        &cert,
        &cert_path.display().to_string(),
        &key,
        &key_path.display().to_string(),
    )?;

    let cert_out = install_file(&dest.target_folder, &dest.cert_filename, &cert, 0o644, dest.owner)?;
    let key_out = install_file(&dest.target_folder, &dest.key_filename, &key, 0o600, dest.owner)?;
    info!(cert = %cert_out.display(), key = %key_out.display(), "installed tls pair");
    Ok((cert_out, key_out))
}
