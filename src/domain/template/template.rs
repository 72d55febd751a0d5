//! `Template` entity — a named container for parsed template versions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TemplateId, Timestamp};

/// A named container for `TemplateVersion`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub created_at: Timestamp,
}

impl Template {
    /// Creates a new template. Templates have no lifecycle of their own;
    /// all state lives on their versions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Reconstructs a template from persisted fields.
    pub fn from_parts(id: TemplateId, name: String, created_at: Timestamp) -> Self {
        Self { id, name, created_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assigns_a_fresh_id() {
        let a = Template::new("Engagement Letter");
        let b = Template::new("Engagement Letter");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn from_parts_preserves_fields() {
        let id = TemplateId::new();
        let created_at = Timestamp::now();
        let template = Template::from_parts(id, "NDA".to_string(), created_at);
        assert_eq!(template.id, id);
        assert_eq!(template.name, "NDA");
        assert_eq!(template.created_at, created_at);
    }
}
