//! # Resource Identity
//!
//! Types naming the translation resources the engine can retrieve:
//! which repository they live in upstream, which cache category they
//! belong to, and how a request is rendered into a cache identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Git ref used when a request does not pin a version.
pub const DEFAULT_REF: &str = "master";

/// Kinds of translation resources served by upstream organizations.
///
/// Each kind maps to a repository named `{language}_{slug}` under the
/// owning organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Literal translation text
    Ult,
    /// Simplified translation text
    Ust,
    /// Translation notes
    Tn,
    /// Translation questions
    Tq,
    /// Translation words
    Tw,
    /// Translation academy articles
    Ta,
}

impl ResourceType {
    /// Repository name suffix for this resource kind.
    pub fn slug(&self) -> &'static str {
        match self {
            ResourceType::Ult => "ult",
            ResourceType::Ust => "ust",
            ResourceType::Tn => "tn",
            ResourceType::Tq => "tq",
            ResourceType::Tw => "tw",
            ResourceType::Ta => "ta",
        }
    }

    /// Cache category this kind is stored and expired under.
    pub fn category(&self) -> ResourceCategory {
        match self {
            ResourceType::Ult | ResourceType::Ust => ResourceCategory::Scripture,
            ResourceType::Tn => ResourceCategory::Notes,
            ResourceType::Tq => ResourceCategory::Questions,
            ResourceType::Tw => ResourceCategory::Words,
            ResourceType::Ta => ResourceCategory::Academy,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ResourceType {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ult" => Ok(ResourceType::Ult),
            "ust" => Ok(ResourceType::Ust),
            "tn" => Ok(ResourceType::Tn),
            "tq" => Ok(ResourceType::Tq),
            "tw" => Ok(ResourceType::Tw),
            "ta" => Ok(ResourceType::Ta),
            other => Err(ResourceError::UnknownResource(other.to_string())),
        }
    }
}

/// Cache categories with independent expiration policies.
///
/// `Catalog` holds upstream listing responses rather than extracted
/// repositories and expires much faster than content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Scripture,
    Notes,
    Questions,
    Words,
    Academy,
    Catalog,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Scripture => "scripture",
            ResourceCategory::Notes => "notes",
            ResourceCategory::Questions => "questions",
            ResourceCategory::Words => "words",
            ResourceCategory::Academy => "academy",
            ResourceCategory::Catalog => "catalog",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-addressed resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Language code, e.g. `en` or `es-419`
    pub language: String,
    /// Upstream organization owning the repository
    pub organization: String,
    /// Resource kind
    pub resource: ResourceType,
    /// Pinned git ref; `None` resolves to [`DEFAULT_REF`]
    pub version: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(
        language: impl Into<String>,
        organization: impl Into<String>,
        resource: ResourceType,
    ) -> Self {
        Self {
            language: language.into(),
            organization: organization.into(),
            resource,
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Upstream repository name, `{language}_{slug}`.
    pub fn repo_name(&self) -> String {
        format!("{}_{}", self.language, self.resource.slug())
    }

    /// Git ref to fetch, falling back to [`DEFAULT_REF`].
    pub fn resolved_ref(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_REF)
    }

    /// Identifier of this request inside its cache category.
    pub fn identifier(&self) -> String {
        format!(
            "{}/{}@{}",
            self.organization,
            self.repo_name(),
            self.resolved_ref()
        )
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_joins_language_and_slug() {
        let desc = ResourceDescriptor::new("en", "unfoldingWord", ResourceType::Ult);
        assert_eq!(desc.repo_name(), "en_ult");
        assert_eq!(desc.resolved_ref(), "master");
        assert_eq!(desc.identifier(), "unfoldingWord/en_ult@master");
    }

    #[test]
    fn pinned_version_overrides_default_ref() {
        let desc =
            ResourceDescriptor::new("es-419", "Door43-Catalog", ResourceType::Tn).with_version("v86");
        assert_eq!(desc.identifier(), "Door43-Catalog/es-419_tn@v86");
    }

    #[test]
    fn resource_types_parse_from_slugs() {
        for kind in [
            ResourceType::Ult,
            ResourceType::Ust,
            ResourceType::Tn,
            ResourceType::Tq,
            ResourceType::Tw,
            ResourceType::Ta,
        ] {
            assert_eq!(kind.slug().parse::<ResourceType>().unwrap(), kind);
        }
        assert_eq!("ULT".parse::<ResourceType>().unwrap(), ResourceType::Ult);
        assert!("obs".parse::<ResourceType>().is_err());
    }

    #[test]
    fn categories_group_scripture_kinds_together() {
        assert_eq!(ResourceType::Ult.category(), ResourceCategory::Scripture);
        assert_eq!(ResourceType::Ust.category(), ResourceCategory::Scripture);
        assert_eq!(ResourceType::Ta.category(), ResourceCategory::Academy);
        assert_eq!(ResourceCategory::Catalog.to_string(), "catalog");
    }
}
