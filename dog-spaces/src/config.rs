use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::{SpacesError, SpacesResult};

/// ACL used when no default ACL is configured
pub const DEFAULT_ACL: &str = "public-read";

/// Cache-Control header attached to every upload unless overridden
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Signing region handed to the SDK. Spaces accepts any region name here.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Routing and ACL rule for a top-level folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRule {
    pub folder_name: String,
    pub acl: String,
}

impl FolderRule {
    pub fn new<N: Into<String>, A: Into<String>>(folder_name: N, acl: A) -> Self {
        Self {
            folder_name: folder_name.into(),
            acl: acl.into(),
        }
    }
}

/// Folder rules indexed by folder name.
///
/// On the wire this is the `folders: [{ folderName, acl }]` list; the map is
/// built once when the configuration is loaded. If a folder name is listed
/// twice the first entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderRules {
    rules: BTreeMap<String, FolderRule>,
}

impl FolderRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule unless one already exists for the same folder
    pub fn insert(&mut self, rule: FolderRule) {
        self.rules.entry(rule.folder_name.clone()).or_insert(rule);
    }

    /// Look up the rule for a folder name
    pub fn get(&self, folder: &str) -> Option<&FolderRule> {
        self.rules.get(folder)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderRule> {
        self.rules.values()
    }
}

impl FromIterator<FolderRule> for FolderRules {
    fn from_iter<I: IntoIterator<Item = FolderRule>>(iter: I) -> Self {
        let mut rules = Self::new();
        for rule in iter {
            rules.insert(rule);
        }
        rules
    }
}

impl Serialize for FolderRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules.values())
    }
}

impl<'de> Deserialize<'de> for FolderRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Option::<Vec<FolderRule>>::deserialize(deserializer)?;
        Ok(list.unwrap_or_default().into_iter().collect())
    }
}

/// Connection and layout settings for a Spaces provider.
///
/// Deserializes from the host's plugin configuration object
/// (`{ key, secret, endpoint, cdn?, space, directory?, acl?, folders? }`).
/// Call [`SpacesConfig::validate`] before use; it normalizes empty optional
/// values to `None` and rejects missing connection fields.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpacesConfig {
    pub key: String,
    pub secret: String,
    /// Spaces endpoint, with or without scheme (e.g. `fra1.digitaloceanspaces.com`)
    pub endpoint: String,
    /// Bucket name
    pub space: String,
    /// CDN host that public URLs are rewritten to (always served over https)
    pub cdn: Option<String>,
    /// Flat key prefix used when no folder rule applies
    pub directory: Option<String>,
    /// Default ACL; when unset every object is `public-read`
    pub acl: Option<String>,
    pub folders: FolderRules,
    pub region: Option<String>,
    pub cache_control: Option<String>,
}

impl fmt::Debug for SpacesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpacesConfig")
            .field("key", &self.key)
            .field("secret", &"***")
            .field("endpoint", &self.endpoint)
            .field("space", &self.space)
            .field("cdn", &self.cdn)
            .field("directory", &self.directory)
            .field("acl", &self.acl)
            .field("folders", &self.folders)
            .field("region", &self.region)
            .field("cache_control", &self.cache_control)
            .finish()
    }
}

impl SpacesConfig {
    /// Create a config with the required connection fields
    pub fn new<K, S, E, B>(key: K, secret: S, endpoint: E, space: B) -> Self
    where
        K: Into<String>,
        S: Into<String>,
        E: Into<String>,
        B: Into<String>,
    {
        Self {
            key: key.into(),
            secret: secret.into(),
            endpoint: endpoint.into(),
            space: space.into(),
            ..Self::default()
        }
    }

    /// Rewrite public URLs to a CDN host
    pub fn with_cdn<S: Into<String>>(mut self, cdn: S) -> Self {
        self.cdn = Some(cdn.into());
        self
    }

    /// Prefix keys with a directory
    pub fn with_directory<S: Into<String>>(mut self, directory: S) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set the default ACL
    pub fn with_acl<S: Into<String>>(mut self, acl: S) -> Self {
        self.acl = Some(acl.into());
        self
    }

    /// Add a folder routing rule
    pub fn with_folder<N: Into<String>, A: Into<String>>(mut self, folder_name: N, acl: A) -> Self {
        self.folders.insert(FolderRule::new(folder_name, acl));
        self
    }

    /// Set the signing region
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Replace the default Cache-Control header
    pub fn with_cache_control<S: Into<String>>(mut self, cache_control: S) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    /// Parse and validate a JSON configuration object
    pub fn from_json(raw: &str) -> SpacesResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()
    }

    /// Validate a configuration object handed over by the host
    pub fn from_value(value: serde_json::Value) -> SpacesResult<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()
    }

    /// Load from environment variables.
    ///
    /// With prefix `SPACES_` this reads `SPACES_KEY`, `SPACES_SECRET`,
    /// `SPACES_ENDPOINT`, `SPACES_SPACE` and the optional `SPACES_CDN`,
    /// `SPACES_DIRECTORY`, `SPACES_ACL`, `SPACES_REGION`,
    /// `SPACES_CACHE_CONTROL` and `SPACES_FOLDERS` (`docs=private,media=public-read`).
    pub fn from_env(prefix: &str) -> SpacesResult<Self> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// Same as [`SpacesConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> SpacesResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", prefix, name));

        let folders = match get("FOLDERS") {
            Some(raw) => parse_folder_list(&raw)?,
            None => FolderRules::new(),
        };

        let config = Self {
            key: get("KEY").unwrap_or_default(),
            secret: get("SECRET").unwrap_or_default(),
            endpoint: get("ENDPOINT").unwrap_or_default(),
            space: get("SPACE").unwrap_or_default(),
            cdn: get("CDN"),
            directory: get("DIRECTORY"),
            acl: get("ACL"),
            folders,
            region: get("REGION"),
            cache_control: get("CACHE_CONTROL"),
        };

        config.validate()
    }

    /// Normalize optional fields and check the required ones.
    ///
    /// Empty strings count as unset. Missing `key`, `secret`, `endpoint` or
    /// `space`, or an endpoint/CDN that is not a host, fail here rather than
    /// on the first request.
    pub fn validate(mut self) -> SpacesResult<Self> {
        for (field, value) in [
            ("key", &self.key),
            ("secret", &self.secret),
            ("endpoint", &self.endpoint),
            ("space", &self.space),
        ] {
            if value.trim().is_empty() {
                return Err(SpacesError::config(format!("`{}` is required", field)));
            }
        }

        self.cdn = non_empty(self.cdn);
        self.directory = non_empty(self.directory);
        self.acl = non_empty(self.acl);
        self.region = non_empty(self.region);
        self.cache_control = non_empty(self.cache_control);

        parse_host_url(&self.endpoint, "endpoint")?;
        if let Some(cdn) = &self.cdn {
            parse_host_url(cdn, "cdn")?;
        }

        Ok(self)
    }

    /// Endpoint as a URL, `https` when no scheme was given
    pub fn endpoint_url(&self) -> SpacesResult<Url> {
        parse_host_url(&self.endpoint, "endpoint")
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn cache_control(&self) -> &str {
        self.cache_control.as_deref().unwrap_or(DEFAULT_CACHE_CONTROL)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse `name=acl` pairs separated by commas
fn parse_folder_list(raw: &str) -> SpacesResult<FolderRules> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, acl) = entry.split_once('=').ok_or_else(|| {
                SpacesError::config(format!("folder rule `{}` must look like name=acl", entry))
            })?;
            let (name, acl) = (name.trim(), acl.trim());
            if name.is_empty() || acl.is_empty() {
                return Err(SpacesError::config(format!(
                    "folder rule `{}` must look like name=acl",
                    entry
                )));
            }
            Ok(FolderRule::new(name, acl))
        })
        .collect()
}

/// Parse a host that may or may not carry a scheme
pub(crate) fn parse_host_url(raw: &str, field: &str) -> SpacesResult<Url> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| SpacesError::config(format!("`{}` is not a valid host ({}): {}", field, raw, e)))?;

    if url.host_str().is_none() {
        return Err(SpacesError::config(format!("`{}` has no host: {}", field, raw)));
    }

    Ok(url)
}
