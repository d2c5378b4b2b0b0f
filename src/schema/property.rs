//! Graph and SQL property names.
//!
//! A property is a two-part identifier: a *space* (the entity or table it
//! belongs to) and a *leaf* name, written `account/name`. A bare `id` or
//! `db/id` is a sentinel standing for the primary key of whatever table the
//! surrounding query resolves to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prop {
    space: Option<String>,
    name: String,
}

impl Prop {
    pub fn new(space: impl Into<String>, name: impl Into<String>) -> Self {
        Prop {
            space: Some(space.into()),
            name: name.into(),
        }
    }

    /// A property with no namespace. Only the `id` sentinel is meaningful
    /// in this form; anything else fails schema validation.
    pub fn bare(name: impl Into<String>) -> Self {
        Prop {
            space: None,
            name: name.into(),
        }
    }

    pub fn space(&self) -> Option<&str> {
        self.space.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table a SQL property lives on, i.e. its space.
    pub fn table(&self) -> Option<&str> {
        self.space()
    }

    /// True for the primary-key sentinels `id` and `db/id`.
    pub fn is_pk_sentinel(&self) -> bool {
        match self.space() {
            None => self.name == "id",
            Some("db") => self.name == "id",
            Some(_) => false,
        }
    }

    /// `table.column` form for FROM/WHERE positions.
    pub fn qualified(&self) -> String {
        match self.space() {
            Some(space) => format!("{}.{}", space, self.name),
            None => self.name.clone(),
        }
    }

    /// Canonical SQL identifier form: dashes become underscores in both
    /// the space and the leaf. All supported drivers share this rule.
    pub fn sqlized(&self) -> Prop {
        Prop {
            space: self.space.as_ref().map(|s| s.replace('-', "_")),
            name: self.name.replace('-', "_"),
        }
    }
}

impl From<&str> for Prop {
    fn from(raw: &str) -> Self {
        match raw.split_once('/') {
            Some((space, name)) => Prop::new(space, name),
            None => Prop::bare(raw),
        }
    }
}

impl From<String> for Prop {
    fn from(raw: String) -> Self {
        Prop::from(raw.as_str())
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.space() {
            Some(space) => write!(f, "{}/{}", space, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for Prop {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Prop {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Prop::from(raw))
    }
}
