use crate::{Error, Result};
use std::fmt;

/// An `owner/name` pair identifying one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a repository reference
/// Accepts formats:
/// - owner/name
/// - github.com/owner/name
/// - https://github.com/owner/name (optionally with `.git` or a trailing path)
pub fn parse_repository(input: &str) -> Result<RepositoryRef> {
    let input = input.trim().trim_end_matches('/');
    let input = input.strip_suffix(".git").unwrap_or(input);

    let input = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let input = input.strip_prefix("github.com/").unwrap_or(input);

    let mut parts = input.split('/');
    let (Some(owner), Some(name)) = (parts.next(), parts.next()) else {
        return Err(Error::Validation(
            "Invalid repository format. Expected: owner/name".to_string(),
        ));
    };

    let (owner, name) = (owner.trim(), name.trim());
    if owner.is_empty() || name.is_empty() {
        return Err(Error::Validation(
            "Repository owner and name cannot be empty".to_string(),
        ));
    }

    Ok(RepositoryRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
