//! Schema source trait and the in-memory node type registry
//!
//! Node type files:
//! - stored at `<schema_dir>/nodetype_<name>.json`, `:` in names written as `_`
//! - one file per node type
//! - malformed files fail the load (FATAL)
//!
//! Property definition lookup walks the effective node type depth-first
//! (the type itself, then each supertype's chain in declaration order).
//! A named definition anywhere in the chain wins over a residual one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::errors::{CheckError, CheckResult};
use super::types::{NodeTypeDefinition, PropertyDefinition};

/// Schema metadata consumed by the checker.
///
/// Implementations hand out a consistent snapshot per call; the checker
/// never retries a failed lookup.
pub trait SchemaSource {
    /// Finds the definition that applies to `property_name` on `node_type`.
    ///
    /// Returns `Ok(None)` if no named or residual definition applies.
    fn lookup_property_definition(
        &self,
        node_type: &str,
        property_name: &str,
    ) -> CheckResult<Option<PropertyDefinition>>;

    /// Finds the definition for `property_name` whose multiplicity matches
    /// `multiple`.
    ///
    /// When no definition of that multiplicity applies, any definition of
    /// the name is returned so callers can report the mismatch. The default
    /// ignores multiplicity.
    fn lookup_property_definition_for(
        &self,
        node_type: &str,
        property_name: &str,
        _multiple: bool,
    ) -> CheckResult<Option<PropertyDefinition>> {
        self.lookup_property_definition(node_type, property_name)
    }

    /// Node types of the node a reference points to, if known.
    fn referenced_node_types(&self, _identifier: &Uuid) -> CheckResult<Option<Vec<String>>> {
        Ok(None)
    }
}

/// Registry that keeps node type definitions in memory and can persist
/// them to a schema directory.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    /// Directory containing node type files, if any
    schema_dir: Option<PathBuf>,
    /// Registered node types by name
    node_types: HashMap<String, NodeTypeDefinition>,
    /// Known referenceable nodes and their effective node types
    referenceable: HashMap<Uuid, Vec<String>>,
}

impl NodeTypeRegistry {
    /// Creates an empty registry with no backing directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry backed by `schema_dir`.
    pub fn with_dir(schema_dir: &Path) -> Self {
        Self {
            schema_dir: Some(schema_dir.to_path_buf()),
            ..Self::default()
        }
    }

    /// Returns the schema directory, if any.
    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Loads every `*.json` node type file in the schema directory.
    ///
    /// A missing directory loads nothing.
    pub fn load_all(&mut self) -> CheckResult<usize> {
        let dir = match &self.schema_dir {
            Some(dir) => dir.clone(),
            None => return Ok(0),
        };
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            CheckError::schema_malformed(
                dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CheckError::schema_malformed(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        // Deterministic load order
        paths.sort();

        for path in &paths {
            self.load_node_type_file(path)?;
        }

        Ok(paths.len())
    }

    /// Loads a single node type file.
    fn load_node_type_file(&mut self, path: &Path) -> CheckResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            CheckError::schema_malformed(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let node_type: NodeTypeDefinition = serde_json::from_str(&content).map_err(|e| {
            CheckError::schema_malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        node_type
            .validate_structure()
            .map_err(|e| CheckError::schema_malformed(path.display().to_string(), e))?;

        self.insert(node_type)
    }

    /// Registers a node type directly.
    pub fn register(&mut self, node_type: NodeTypeDefinition) -> CheckResult<()> {
        node_type
            .validate_structure()
            .map_err(|e| CheckError::schema_malformed("<in-memory>", e))?;
        self.insert(node_type)
    }

    fn insert(&mut self, mut node_type: NodeTypeDefinition) -> CheckResult<()> {
        if self.node_types.contains_key(&node_type.name) {
            return Err(CheckError::node_type_immutable(&node_type.name));
        }
        node_type.bind_declaring_type();
        self.node_types.insert(node_type.name.clone(), node_type);
        Ok(())
    }

    /// Records a referenceable node and its node types.
    pub fn register_referenceable<I, S>(&mut self, identifier: Uuid, node_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referenceable
            .insert(identifier, node_types.into_iter().map(Into::into).collect());
    }

    /// Gets a node type by name.
    pub fn get(&self, name: &str) -> Option<&NodeTypeDefinition> {
        self.node_types.get(name)
    }

    /// Checks if a node type exists.
    pub fn exists(&self, name: &str) -> bool {
        self.node_types.contains_key(name)
    }

    /// Returns all registered node types.
    pub fn all_node_types(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.node_types.values()
    }

    /// Returns the number of registered node types.
    pub fn node_type_count(&self) -> usize {
        self.node_types.len()
    }

    /// Returns `name` followed by all of its supertypes, depth-first.
    ///
    /// # Errors
    ///
    /// NODETYPE_UNKNOWN_NODE_TYPE if `name` is not registered, and
    /// NODETYPE_BROKEN_HIERARCHY for a missing or cyclic supertype.
    pub fn effective_node_types(&self, name: &str) -> CheckResult<Vec<&NodeTypeDefinition>> {
        let root = self
            .node_types
            .get(name)
            .ok_or_else(|| CheckError::unknown_node_type(name))?;

        let mut chain = Vec::new();
        let mut stack = Vec::new();
        self.walk(root, name, &mut stack, &mut chain)?;
        Ok(chain)
    }

    fn walk<'a>(
        &'a self,
        node_type: &'a NodeTypeDefinition,
        root: &str,
        stack: &mut Vec<&'a str>,
        chain: &mut Vec<&'a NodeTypeDefinition>,
    ) -> CheckResult<()> {
        if stack.contains(&node_type.name.as_str()) {
            return Err(CheckError::broken_hierarchy(
                root,
                format!("cycle through '{}'", node_type.name),
            ));
        }
        // Diamond inheritance: already collected through another branch
        if chain.iter().any(|seen| seen.name == node_type.name) {
            return Ok(());
        }

        stack.push(&node_type.name);
        chain.push(node_type);
        for supertype in &node_type.supertypes {
            let def = self.node_types.get(supertype).ok_or_else(|| {
                CheckError::broken_hierarchy(root, format!("supertype '{}' not registered", supertype))
            })?;
            self.walk(def, root, stack, chain)?;
        }
        stack.pop();
        Ok(())
    }

    /// Saves a node type to the schema directory.
    pub fn save_node_type(&self, node_type: &NodeTypeDefinition) -> CheckResult<PathBuf> {
        let dir = self.schema_dir.as_ref().ok_or_else(|| {
            CheckError::schema_unavailable("registry has no schema directory")
        })?;

        let filename = format!("nodetype_{}.json", node_type.name.replace(':', "_"));
        let path = dir.join(&filename);

        if path.exists() {
            return Err(CheckError::node_type_immutable(&node_type.name));
        }

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                CheckError::schema_malformed(
                    dir.display().to_string(),
                    format!("Failed to create schema directory: {}", e),
                )
            })?;
        }

        let content = serde_json::to_string_pretty(node_type).map_err(|e| {
            CheckError::schema_malformed(
                path.display().to_string(),
                format!("Failed to serialize node type: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            CheckError::schema_malformed(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}

impl NodeTypeRegistry {
    /// Named definitions anywhere in the chain win over residual ones.
    fn resolve(
        &self,
        node_type: &str,
        property_name: &str,
        multiple: Option<bool>,
    ) -> CheckResult<Option<PropertyDefinition>> {
        let chain = self.effective_node_types(node_type)?;

        let found = chain
            .iter()
            .find_map(|nt| nt.named_definition(property_name, multiple))
            .or_else(|| chain.iter().find_map(|nt| nt.residual_definition(multiple)));
        Ok(found.cloned())
    }
}

impl SchemaSource for NodeTypeRegistry {
    fn lookup_property_definition(
        &self,
        node_type: &str,
        property_name: &str,
    ) -> CheckResult<Option<PropertyDefinition>> {
        self.resolve(node_type, property_name, None)
    }

    fn lookup_property_definition_for(
        &self,
        node_type: &str,
        property_name: &str,
        multiple: bool,
    ) -> CheckResult<Option<PropertyDefinition>> {
        match self.resolve(node_type, property_name, Some(multiple))? {
            Some(def) => Ok(Some(def)),
            None => self.resolve(node_type, property_name, None),
        }
    }

    fn referenced_node_types(&self, identifier: &Uuid) -> CheckResult<Option<Vec<String>>> {
        Ok(self.referenceable.get(identifier).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetype::types::RESIDUAL_NAME;
    use crate::value::SemanticType;
    use tempfile::TempDir;

    fn base_type() -> NodeTypeDefinition {
        NodeTypeDefinition::new(
            "test:base",
            vec![
                PropertyDefinition::single("test:created", SemanticType::Date),
                PropertyDefinition::single(RESIDUAL_NAME, SemanticType::String),
            ],
        )
    }

    fn event_type() -> NodeTypeDefinition {
        NodeTypeDefinition::new(
            "test:event",
            vec![PropertyDefinition::multiple("test:reminders", SemanticType::Date)],
        )
        .with_supertypes(["test:base"])
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(base_type()).unwrap();

        let nt = registry.get("test:base").unwrap();
        assert_eq!(nt.name, "test:base");
        assert!(registry.exists("test:base"));
    }

    #[test]
    fn test_node_type_immutability() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(base_type()).unwrap();

        let result = registry.register(base_type());
        assert_eq!(result.unwrap_err().code().code(), "NODETYPE_IMMUTABLE");
    }

    #[test]
    fn test_inherited_and_residual_lookup() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(base_type()).unwrap();
        registry.register(event_type()).unwrap();

        let inherited = registry
            .lookup_property_definition("test:event", "test:created")
            .unwrap()
            .unwrap();
        assert_eq!(inherited.declaring_node_type, "test:base");

        let own = registry
            .lookup_property_definition("test:event", "test:reminders")
            .unwrap()
            .unwrap();
        assert!(own.is_multiple());

        let residual = registry
            .lookup_property_definition("test:event", "anything")
            .unwrap()
            .unwrap();
        assert!(residual.is_residual());
    }

    #[test]
    fn test_missing_definition() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(event_type()).unwrap();
        registry
            .register(NodeTypeDefinition::new("test:base", vec![]))
            .unwrap();

        assert!(registry
            .lookup_property_definition("test:event", "unknown")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_node_type() {
        let registry = NodeTypeRegistry::new();
        let err = registry
            .lookup_property_definition("test:nope", "x")
            .unwrap_err();
        assert_eq!(err.code().code(), "NODETYPE_UNKNOWN_NODE_TYPE");
    }

    #[test]
    fn test_missing_supertype_is_broken_hierarchy() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(event_type()).unwrap();

        let err = registry
            .lookup_property_definition("test:event", "test:created")
            .unwrap_err();
        assert_eq!(err.code().code(), "NODETYPE_BROKEN_HIERARCHY");
    }

    #[test]
    fn test_supertype_cycle_detected() {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeDefinition::new("test:a", vec![]).with_supertypes(["test:b"]))
            .unwrap();
        registry
            .register(NodeTypeDefinition::new("test:b", vec![]).with_supertypes(["test:a"]))
            .unwrap();

        let err = registry.effective_node_types("test:a").unwrap_err();
        assert_eq!(err.code().code(), "NODETYPE_BROKEN_HIERARCHY");
    }

    #[test]
    fn test_lookup_prefers_matching_multiplicity() {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeDefinition::new(
                "test:open",
                vec![
                    PropertyDefinition::single(RESIDUAL_NAME, SemanticType::Undefined),
                    PropertyDefinition::multiple(RESIDUAL_NAME, SemanticType::Undefined),
                ],
            ))
            .unwrap();
        registry
            .register(
                NodeTypeDefinition::new(
                    "test:tagged",
                    vec![PropertyDefinition::single("test:tag", SemanticType::Name)],
                )
                .with_supertypes(["test:open"]),
            )
            .unwrap();

        let single = registry
            .lookup_property_definition_for("test:tagged", "test:tag", false)
            .unwrap()
            .unwrap();
        assert_eq!(single.declared_type(), SemanticType::Name);

        // No named multi-valued definition: the multi-valued residual applies
        let many = registry
            .lookup_property_definition_for("test:tagged", "test:tag", true)
            .unwrap()
            .unwrap();
        assert!(many.is_residual());
        assert!(many.is_multiple());
    }

    #[test]
    fn test_lookup_falls_back_to_any_multiplicity() {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeDefinition::new("test:base", vec![]))
            .unwrap();
        registry.register(event_type()).unwrap();

        let def = registry
            .lookup_property_definition_for("test:event", "test:reminders", false)
            .unwrap()
            .unwrap();
        assert!(def.is_multiple());
    }

    #[test]
    fn test_matching_residual_beats_mismatched_named() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(base_type()).unwrap();
        registry.register(event_type()).unwrap();

        let def = registry
            .lookup_property_definition_for("test:event", "test:reminders", false)
            .unwrap()
            .unwrap();
        assert!(def.is_residual());
        assert_eq!(def.declared_type(), SemanticType::String);
    }

    #[test]
    fn test_diamond_inheritance() {
        let mut registry = NodeTypeRegistry::new();
        registry.register(NodeTypeDefinition::new("test:root", vec![])).unwrap();
        registry
            .register(NodeTypeDefinition::new("test:left", vec![]).with_supertypes(["test:root"]))
            .unwrap();
        registry
            .register(NodeTypeDefinition::new("test:right", vec![]).with_supertypes(["test:root"]))
            .unwrap();
        registry
            .register(
                NodeTypeDefinition::new("test:leaf", vec![])
                    .with_supertypes(["test:left", "test:right"]),
            )
            .unwrap();

        let names: Vec<_> = registry
            .effective_node_types("test:leaf")
            .unwrap()
            .iter()
            .map(|nt| nt.name.as_str())
            .collect();
        assert_eq!(names, vec!["test:leaf", "test:left", "test:root", "test:right"]);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let registry = NodeTypeRegistry::with_dir(temp_dir.path());
        let path = registry.save_node_type(&base_type()).unwrap();
        assert!(path.ends_with("nodetype_test_base.json"));

        let mut loaded = NodeTypeRegistry::with_dir(temp_dir.path());
        assert_eq!(loaded.load_all().unwrap(), 1);
        assert!(loaded.exists("test:base"));
        assert_eq!(
            loaded.get("test:base").unwrap().property_definitions[0].declaring_node_type,
            "test:base"
        );
    }

    #[test]
    fn test_save_twice_is_immutable() {
        let temp_dir = TempDir::new().unwrap();
        let registry = NodeTypeRegistry::with_dir(temp_dir.path());
        registry.save_node_type(&base_type()).unwrap();
        let err = registry.save_node_type(&base_type()).unwrap_err();
        assert_eq!(err.code().code(), "NODETYPE_IMMUTABLE");
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("nodetype_bad.json"), "{not json").unwrap();

        let mut registry = NodeTypeRegistry::with_dir(temp_dir.path());
        let err = registry.load_all().unwrap_err();
        assert_eq!(err.code().code(), "NODETYPE_SCHEMA_MALFORMED");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = NodeTypeRegistry::with_dir(&temp_dir.path().join("absent"));
        assert_eq!(registry.load_all().unwrap(), 0);
        assert_eq!(registry.node_type_count(), 0);
    }

    #[test]
    fn test_referenceable_nodes() {
        let mut registry = NodeTypeRegistry::new();
        let id = Uuid::new_v4();
        registry.register_referenceable(id, ["test:target", "test:base"]);
        assert_eq!(
            registry.referenced_node_types(&id).unwrap(),
            Some(vec!["test:target".to_string(), "test:base".to_string()])
        );
        assert_eq!(registry.referenced_node_types(&Uuid::nil()).unwrap(), None);
    }
}
