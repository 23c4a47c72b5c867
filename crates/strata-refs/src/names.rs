//! Reference name parsing following container-registry conventions.
//!
//! A name has the form `[registry/]path[:tag]`:
//! - Path components are lowercase alphanumerics joined by single
//!   separators: `.`, `_`, `__`, or a run of `-`
//! - The first component is a registry host when the name has more than one
//!   component and the first contains `.` or `:` or is `localhost`
//! - The tag is `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}` and defaults to `latest`
//! - The whole name is at most 255 characters
//! - A repository that looks like a 64-hex content ID is rejected

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::ContentId;

use crate::error::{RefError, Result};

/// Tag applied when a name has none.
pub const DEFAULT_TAG: &str = "latest";

const MAX_NAME_LEN: usize = 255;
const MAX_TAG_LEN: usize = 128;

/// A validated, normalized `repository:tag` name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName {
    repository: String,
    tag: String,
}

impl TagName {
    /// Parse a name, applying [`DEFAULT_TAG`] when no tag is given.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_refs::TagName;
    ///
    /// let name = TagName::parse("busybox").unwrap();
    /// assert_eq!(name.to_string(), "busybox:latest");
    /// assert!(TagName::parse("Busybox").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_with_default(s, DEFAULT_TAG)
    }

    /// Parse a name, applying `default_tag` when no tag is given.
    pub fn parse_with_default(s: &str, default_tag: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(invalid(s, "name must not be empty"));
        }
        if s.len() > MAX_NAME_LEN {
            return Err(invalid(
                s,
                &format!("name exceeds {MAX_NAME_LEN} characters"),
            ));
        }
        if s.contains('@') {
            return Err(invalid(s, "digest references are not supported"));
        }

        let (repository, tag) = split_tag(s);
        let tag = tag.unwrap_or(default_tag);
        validate_tag(s, tag)?;
        validate_repository(s, repository)?;

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// The repository part (everything before the tag).
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The tag part.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl TryFrom<String> for TagName {
    type Error = RefError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.to_string()
    }
}

fn invalid(name: &str, reason: &str) -> RefError {
    RefError::InvalidReference {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Split off the tag: the last `:` that follows the last `/`.
fn split_tag(s: &str) -> (&str, Option<&str>) {
    let path_start = s.rfind('/').map(|i| i + 1).unwrap_or(0);
    match s[path_start..].rfind(':') {
        Some(i) => (&s[..path_start + i], Some(&s[path_start + i + 1..])),
        None => (s, None),
    }
}

fn validate_tag(name: &str, tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(invalid(name, "tag must not be empty"));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(invalid(name, &format!("tag exceeds {MAX_TAG_LEN} characters")));
    }
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err(invalid(name, &format!("invalid tag: {tag:?}")));
    }
    Ok(())
}

fn validate_repository(name: &str, repository: &str) -> Result<()> {
    if repository.is_empty() {
        return Err(invalid(name, "repository must not be empty"));
    }
    if ContentId::is_id_like(repository) {
        return Err(invalid(
            name,
            "repository name must not be a 64-character hex string",
        ));
    }

    let mut components: Vec<&str> = repository.split('/').collect();
    if components.len() > 1 && is_registry_host(components[0]) {
        validate_host(name, components[0])?;
        components.remove(0);
    }
    for component in components {
        validate_path_component(name, component)?;
    }
    Ok(())
}

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn validate_host(name: &str, host: &str) -> Result<()> {
    let (hostname, port) = match host.split_once(':') {
        Some((h, p)) => (h, Some(p)),
        None => (host, None),
    };
    if let Some(port) = port {
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(name, &format!("invalid registry port: {port:?}")));
        }
    }
    for label in hostname.split('.') {
        let valid = !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(invalid(name, &format!("invalid registry host: {host:?}")));
        }
    }
    Ok(())
}

/// `[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*`
fn validate_path_component(name: &str, component: &str) -> Result<()> {
    let reject = || invalid(name, &format!("invalid path component: {component:?}"));
    let bytes = component.as_bytes();
    if bytes.is_empty() {
        return Err(reject());
    }

    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let mut i = 0;
    loop {
        // A run of alphanumerics.
        let run_start = i;
        while i < bytes.len() && is_alnum(bytes[i]) {
            i += 1;
        }
        if i == run_start {
            return Err(reject());
        }
        if i == bytes.len() {
            return Ok(());
        }

        // Followed by exactly one separator.
        match bytes[i] {
            b'.' => i += 1,
            b'_' => {
                i += 1;
                if i < bytes.len() && bytes[i] == b'_' {
                    i += 1;
                }
            }
            b'-' => {
                while i < bytes.len() && bytes[i] == b'-' {
                    i += 1;
                }
            }
            _ => return Err(reject()),
        }
    }
}
