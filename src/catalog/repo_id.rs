use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::bail;

/// A validated `owner/repo` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: Box<str>,
    name: Box<str>,
}

impl RepoId {
    /// Parse an `owner/repo` identifier.
    ///
    /// # Errors
    ///
    /// Fails when the id has no slash, has an empty owner or name, or contains
    /// more than one slash.
    pub fn parse(id: &str) -> Result<Self> {
        let Some((owner, name)) = id.split_once('/') else {
            bail!("invalid repository id (expected 'owner/repo'): {id}");
        };

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository id: empty owner or repo name: {id}");
        }

        Ok(Self {
            owner: Box::from(owner),
            name: Box::from(name),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
