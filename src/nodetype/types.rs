//! Node type and property definition types
//!
//! A node type declares property definitions, each binding a property name
//! (or the residual name `*`) to:
//! - a required semantic type
//! - single or multiple values
//! - zero or more value constraints (disjunctive)
//! - mandatory / protected flags

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::value::{is_valid_name, SemanticType};

/// Property name matching any property without a named definition.
pub const RESIDUAL_NAME: &str = "*";

fn default_allow_empty() -> bool {
    true
}

/// Property definition owned by the schema source.
///
/// The checker only reads definitions; the required type is fixed for the
/// lifetime of the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Property name, or `*` for a residual definition
    pub name: String,
    /// Node type that declares this definition
    #[serde(default)]
    pub declaring_node_type: String,
    /// Required value type
    pub required_type: SemanticType,
    /// Whether the property holds an array of values
    #[serde(default)]
    pub multiple: bool,
    /// Constraint expressions, any one of which must match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_constraints: Vec<String>,
    /// Whether the property must always be present
    #[serde(default)]
    pub mandatory: bool,
    /// Whether the property can only be written by the store itself
    #[serde(default)]
    pub protected: bool,
    /// Whether a multi-valued property accepts a zero-length array
    #[serde(default = "default_allow_empty")]
    pub allow_empty: bool,
}

impl PropertyDefinition {
    fn new(name: impl Into<String>, required_type: SemanticType, multiple: bool) -> Self {
        Self {
            name: name.into(),
            declaring_node_type: String::new(),
            required_type,
            multiple,
            value_constraints: Vec::new(),
            mandatory: false,
            protected: false,
            allow_empty: true,
        }
    }

    /// Create a single-valued definition
    pub fn single(name: impl Into<String>, required_type: SemanticType) -> Self {
        Self::new(name, required_type, false)
    }

    /// Create a multi-valued definition
    pub fn multiple(name: impl Into<String>, required_type: SemanticType) -> Self {
        Self::new(name, required_type, true)
    }

    /// Adds value constraints
    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_constraints
            .extend(constraints.into_iter().map(Into::into));
        self
    }

    /// Marks the definition mandatory
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Marks the definition protected
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Refuses zero-length arrays
    pub fn disallow_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    /// Declared value type
    pub fn declared_type(&self) -> SemanticType {
        self.required_type
    }

    /// Whether the definition is multi-valued
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Declared constraint expressions
    pub fn constraints(&self) -> &[String] {
        &self.value_constraints
    }

    /// Whether this is a residual (`*`) definition
    pub fn is_residual(&self) -> bool {
        self.name == RESIDUAL_NAME
    }
}

/// Node type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeDefinition {
    /// Unique node type name
    pub name: String,
    /// Direct supertypes, in lookup order
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared property definitions
    #[serde(default)]
    pub property_definitions: Vec<PropertyDefinition>,
}

impl NodeTypeDefinition {
    /// Create a node type, binding every definition to it
    pub fn new(name: impl Into<String>, property_definitions: Vec<PropertyDefinition>) -> Self {
        let mut nt = Self {
            name: name.into(),
            supertypes: Vec::new(),
            description: None,
            property_definitions,
        };
        nt.bind_declaring_type();
        nt
    }

    /// Adds direct supertypes
    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supertypes.extend(supertypes.into_iter().map(Into::into));
        self
    }

    /// Sets `declaring_node_type` on every property definition.
    pub fn bind_declaring_type(&mut self) {
        for def in &mut self.property_definitions {
            def.declaring_node_type = self.name.clone();
        }
    }

    /// Named definition declared directly on this type.
    ///
    /// With `multiple` set, only a definition of that multiplicity matches.
    pub fn named_definition(
        &self,
        property_name: &str,
        multiple: Option<bool>,
    ) -> Option<&PropertyDefinition> {
        self.property_definitions
            .iter()
            .find(|d| !d.is_residual() && d.name == property_name && fits(d, multiple))
    }

    /// Residual definition declared directly on this type.
    pub fn residual_definition(&self, multiple: Option<bool>) -> Option<&PropertyDefinition> {
        self.property_definitions
            .iter()
            .find(|d| d.is_residual() && fits(d, multiple))
    }

    /// Validates the node type structure itself (not any value)
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_valid_name(&self.name) {
            return Err(format!("'{}' is not a valid node type name", self.name));
        }

        for supertype in &self.supertypes {
            if supertype == &self.name {
                return Err(format!("'{}' lists itself as a supertype", self.name));
            }
        }

        // One single-valued and one multi-valued definition per name
        let mut seen = HashSet::new();
        for def in &self.property_definitions {
            if !def.is_residual() && !is_valid_name(&def.name) {
                return Err(format!("'{}' is not a valid property name", def.name));
            }
            if !seen.insert((def.name.as_str(), def.multiple)) {
                return Err(format!(
                    "{} property '{}' is defined more than once",
                    if def.multiple { "multi-valued" } else { "single-valued" },
                    def.name
                ));
            }
        }

        Ok(())
    }
}

fn fits(def: &PropertyDefinition, multiple: Option<bool>) -> bool {
    multiple.map_or(true, |m| def.multiple == m)
}
