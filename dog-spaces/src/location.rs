//! Object key, ACL and public URL derivation.
//!
//! Filenames may carry a two-level folder path, `mainFolder_subFolder_rest`.
//! When `mainFolder` has a folder rule in the configuration the object is
//! stored under `folderName/subFolder/` and gets the rule's ACL. Everything
//! else lands flat, or under the configured `directory`.

use md5::{Digest, Md5};
use url::Url;

use crate::config::{parse_host_url, DEFAULT_ACL};
use crate::{FileRef, SpacesConfig, SpacesError, SpacesResult};

/// Lowercase hex MD5 digest of a string
pub fn md5_hex(input: &str) -> String {
    md5_hex_bytes(input.as_bytes())
}

pub(crate) fn md5_hex_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Derives where a file lives and who may read it
#[derive(Debug, Clone)]
pub struct LocationResolver {
    config: SpacesConfig,
    /// `https://<cdn-host>[:port]`, parsed once from `config.cdn`
    cdn_base: Option<Url>,
}

impl LocationResolver {
    /// Validate `config` and prepare the CDN base URL.
    ///
    /// Empty optional values are treated as unset, so an empty `directory`
    /// or `cdn` behaves exactly like a missing one.
    pub fn new(config: SpacesConfig) -> SpacesResult<Self> {
        let config = config.validate()?;
        let cdn_base = config.cdn.as_deref().map(parse_cdn_base).transpose()?;
        Ok(Self { config, cdn_base })
    }

    pub fn config(&self) -> &SpacesConfig {
        &self.config
    }

    /// Storage key for a file.
    ///
    /// `file.hash` is taken verbatim; the provider digests it before calling.
    pub fn object_key(&self, file: &FileRef) -> String {
        let filename = file.filename();

        // at least two separators: mainFolder_subFolder_rest
        let mut segments = file.name.splitn(3, '_');
        if let (Some(main_folder), Some(sub_folder), Some(_)) =
            (segments.next(), segments.next(), segments.next())
        {
            if let Some(rule) = self.config.folders.get(main_folder) {
                return format!("{}/{}/{}", rule.folder_name, sub_folder, filename);
            }
        }

        match &self.config.directory {
            Some(directory) => format!("{}/{}", directory, filename),
            None => filename,
        }
    }

    /// Canned ACL for a file
    pub fn acl(&self, file: &FileRef) -> String {
        let Some(default_acl) = &self.config.acl else {
            return DEFAULT_ACL.to_string();
        };

        let folder = file.name.split('_').next().unwrap_or_default();
        match self.config.folders.get(folder) {
            Some(rule) => rule.acl.clone(),
            None => default_acl.clone(),
        }
    }

    /// Public URL for an uploaded object.
    ///
    /// Without a CDN this is the location reported by the store. With one,
    /// the CDN host is used over https whatever scheme it was configured
    /// with, and the object key becomes the path.
    pub fn public_url(&self, location: &str, key: &str) -> String {
        match &self.cdn_base {
            Some(base) => {
                let mut url = base.clone();
                url.set_path(key);
                url.to_string()
            }
            None => location.to_string(),
        }
    }
}

/// Host and port of the configured CDN, always over https
fn parse_cdn_base(cdn: &str) -> SpacesResult<Url> {
    let parsed = parse_host_url(cdn, "cdn")?;
    let host = parsed
        .host_str()
        .ok_or_else(|| SpacesError::config(format!("`cdn` has no host: {}", cdn)))?;

    let mut base = Url::parse(&format!("https://{}", host))
        .map_err(|e| SpacesError::config(format!("`cdn` host {} is not usable: {}", host, e)))?;
    base.set_port(parsed.port())
        .map_err(|()| SpacesError::config(format!("`cdn` host {} cannot carry a port", host)))?;

    Ok(base)
}
