use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type ResourceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Book,
    Slides,
    Lab,
    Classroom,
    Computer,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Book => "BOOK",
            ResourceType::Slides => "SLIDES",
            ResourceType::Lab => "LAB",
            ResourceType::Classroom => "CLASSROOM",
            ResourceType::Computer => "COMPUTER",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOK" => Ok(ResourceType::Book),
            "SLIDES" => Ok(ResourceType::Slides),
            "LAB" => Ok(ResourceType::Lab),
            "CLASSROOM" | "ROOM" => Ok(ResourceType::Classroom),
            "COMPUTER" => Ok(ResourceType::Computer),
            other => Err(format!("unknown resource type '{other}'")),
        }
    }
}

/// Variant-specific data of a shared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKind {
    Book { author: String, isbn: String },
    Classroom { capacity: u32, building: String },
    /// Slides, labs and computers carry no extra data.
    General { resource_type: ResourceType },
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Book { .. } => ResourceType::Book,
            ResourceKind::Classroom { .. } => ResourceType::Classroom,
            ResourceKind::General { resource_type } => *resource_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResource {
    pub name: String,
    pub kind: ResourceKind,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewResource {
    pub fn book(name: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Book {
                author: author.into(),
                isbn: isbn.into(),
            },
            available: true,
        }
    }

    pub fn classroom(name: impl Into<String>, capacity: u32, building: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Classroom {
                capacity,
                building: building.into(),
            },
            available: true,
        }
    }

    pub fn general(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::General { resource_type },
            available: true,
        }
    }

    pub(crate) fn into_resource(self, id: ResourceId) -> Resource {
        Resource {
            id,
            name: self.name,
            kind: self.kind,
            available: self.available,
        }
    }
}

/// A shared resource. Its bookings live on the sessions that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub kind: ResourceKind,
    pub available: bool,
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.id, self.name, self.resource_type())
    }
}
