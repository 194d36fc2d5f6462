use serde::{Deserialize, Serialize};

/// A contributing entity attached to a record, with its roles
/// (e.g. `publisher`, `author`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub entity: Entity,
    #[serde(rename = "role", default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// Contributor entity. Organizations are publisher boilerplate; persons are
/// rapporteurs and carry affiliations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Organization(Organization),
    Person(Person),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    /// Set-like by value equality: no duplicate organization.
    #[serde(rename = "affiliation", default, skip_serializing_if = "Vec::is_empty")]
    pub affiliations: Vec<Organization>,
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Organization(org) => &org.name,
            Entity::Person(person) => &person.name,
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Entity::Person(person) => Some(person),
            Entity::Organization(_) => None,
        }
    }
}

impl Contributor {
    pub fn organization(org: Organization, role: &str) -> Self {
        Self {
            entity: Entity::Organization(org),
            roles: vec![role.to_string()],
        }
    }

    pub fn person(person: Person, role: &str) -> Self {
        Self {
            entity: Entity::Person(person),
            roles: vec![role.to_string()],
        }
    }
}
