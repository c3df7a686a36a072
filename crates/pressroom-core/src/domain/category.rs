use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Category entity - groups posts. Names are free text and need not be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: Self::validate_name(name)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, name: String, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.name = Self::validate_name(name)?;
        self.updated_at = now;
        Ok(())
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }
        Ok(name.to_string())
    }
}
