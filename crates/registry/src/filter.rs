use std::{cmp::Reverse, str::FromStr};

use crate::types::{CacheStatus, ProjectMetadata, Registry};

/// Ordering for [`ListFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListSort {
    #[default]
    Name,
    /// Most recently active first.
    LastActive,
    /// Oldest registration first.
    Created,
}

impl FromStr for ListSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "recent" | "last-active" => Ok(Self::LastActive),
            "created" => Ok(Self::Created),
            other => Err(format!("unknown sort `{other}` (expected name, recent or created)")),
        }
    }
}

/// Options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub cache_status: Option<CacheStatus>,
    /// Case-insensitive substring match on the name or description.
    pub name_contains: Option<String>,
    pub sort: ListSort,
}

impl ListFilter {
    pub fn matches(&self, project: &ProjectMetadata) -> bool {
        if let Some(status) = self.cache_status
            && project.cache_status != status
        {
            return false;
        }
        match self.name_contains.as_deref().map(str::to_lowercase) {
            Some(needle) if !needle.is_empty() => {
                project.name.to_lowercase().contains(&needle)
                    || project
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            },
            _ => true,
        }
    }

    pub fn apply(&self, registry: &Registry) -> Vec<ProjectMetadata> {
        let mut out: Vec<ProjectMetadata> = registry
            .projects
            .values()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        match self.sort {
            // BTreeMap iteration is already name-ordered.
            ListSort::Name => {},
            ListSort::LastActive => out.sort_by_key(|p| Reverse(p.last_active)),
            ListSort::Created => out.sort_by_key(|p| p.created_at),
        }
        out
    }
}
