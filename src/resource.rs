//! Resource nodes: one navigable node per resource of a surface document.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::{object_field, resource_pointer, SurfaceDocument};
use crate::error::{ImmutableAttributeError, SchemaError};
use crate::method::BoundOperation;
use crate::param::normalize_identifier;
use crate::types::{json_type_name, DESCRIPTOR_KEY};

/// A fixed member of a resource node.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Resource(ResourceNode),
    Method(BoundOperation),
}

/// Result of looking up an attribute by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute<'a> {
    Resource(&'a ResourceNode),
    Method(&'a BoundOperation),
    /// The node's own descriptor document, under [`DESCRIPTOR_KEY`].
    Descriptor(&'a Value),
    /// A free-form attribute set after construction.
    Extra(&'a Value),
}

impl Attribute<'_> {
    /// Whether the attribute was fixed at construction.
    pub fn is_fixed(&self) -> bool {
        !matches!(self, Attribute::Extra(_))
    }
}

/// Name-based attribute access shared by API roots and resource nodes.
///
/// Fixed attributes (members and the descriptor) are read-only; any other
/// name can be set and deleted freely.
pub trait Namespace {
    /// Human-readable owner used in error messages.
    fn owner(&self) -> String;

    fn attribute(&self, name: &str) -> Option<Attribute<'_>>;

    fn extras_mut(&mut self) -> &mut IndexMap<String, Value>;

    /// # Errors
    ///
    /// Returns `ImmutableAttributeError::CannotSet` if `name` is fixed.
    fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), ImmutableAttributeError> {
        if self.attribute(name).is_some_and(|a| a.is_fixed()) {
            return Err(ImmutableAttributeError::CannotSet {
                owner: self.owner(),
                name: name.to_string(),
            });
        }
        self.extras_mut().insert(name.to_string(), value);
        Ok(())
    }

    /// Remove a free-form attribute, returning its value if it was set.
    ///
    /// # Errors
    ///
    /// Returns `ImmutableAttributeError::CannotDelete` if `name` is fixed.
    fn delete_attribute(&mut self, name: &str) -> Result<Option<Value>, ImmutableAttributeError> {
        if self.attribute(name).is_some_and(|a| a.is_fixed()) {
            return Err(ImmutableAttributeError::CannotDelete {
                owner: self.owner(),
                name: name.to_string(),
            });
        }
        Ok(self.extras_mut().shift_remove(name))
    }
}

/// A resource with its nested resources and bound operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    path: Vec<String>,
    descriptor: Value,
    members: IndexMap<String, Member>,
    extras: IndexMap<String, Value>,
}

/// Build the node for the resource at `resource_path` (raw schema names).
///
/// # Errors
///
/// Returns `SchemaError` if the resource, any nested resource, or any of
/// their methods is malformed.
pub fn build_resource(
    document: &SurfaceDocument<'_>,
    resource_path: &[&str],
) -> Result<ResourceNode, SchemaError> {
    let decl = document.resource_entry(resource_path)?;
    let raw: Vec<String> = resource_path.iter().map(|s| s.to_string()).collect();
    ResourceNode::from_decl(document, &raw, decl)
}

impl ResourceNode {
    pub(crate) fn from_decl(
        document: &SurfaceDocument<'_>,
        raw_path: &[String],
        decl: &Map<String, Value>,
    ) -> Result<Self, SchemaError> {
        let pointer = resource_pointer(raw_path);
        let path: Vec<String> = raw_path.iter().map(|s| normalize_identifier(s)).collect();
        let owner = format!("resource {}", path.join("."));
        let mut members = IndexMap::new();

        if let Some(children) = object_field(decl, "resources", &pointer)? {
            for (name, child) in children {
                let child_pointer = format!("{}/resources/{}", pointer, name);
                let child = child.as_object().ok_or_else(|| SchemaError::InvalidShape {
                    path: child_pointer,
                    expected: "object",
                    actual: json_type_name(child).to_string(),
                })?;

                let mut child_path = raw_path.to_vec();
                child_path.push(name.clone());
                let node = ResourceNode::from_decl(document, &child_path, child)?;
                insert_member(&mut members, &owner, name, Member::Resource(node))?;
            }
        }

        if let Some(methods) = object_field(decl, "methods", &pointer)? {
            for (name, method) in methods {
                let method_pointer = format!("{}/methods/{}", pointer, name);
                let method = method.as_object().ok_or_else(|| SchemaError::InvalidShape {
                    path: method_pointer.clone(),
                    expected: "object",
                    actual: json_type_name(method).to_string(),
                })?;

                let operation =
                    BoundOperation::from_decl(document, path.clone(), name, method, &method_pointer)?;
                insert_member(&mut members, &owner, name, Member::Method(operation))?;
            }
        }

        debug!(resource = %path.join("."), members = members.len(), "built resource");

        Ok(Self {
            path,
            descriptor: Value::Object(decl.clone()),
            members,
            extras: IndexMap::new(),
        })
    }

    /// Identifier of this resource on its parent.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Identifiers from the API root down to this resource.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The resource's own schema.
    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceNode> {
        match self.members.get(name)? {
            Member::Resource(node) => Some(node),
            Member::Method(_) => None,
        }
    }

    pub fn method(&self, name: &str) -> Option<&BoundOperation> {
        match self.members.get(name)? {
            Member::Method(op) => Some(op),
            Member::Resource(_) => None,
        }
    }

    /// All fixed members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Operations owned directly by this resource (nested ones excluded).
    ///
    /// Each call starts a fresh pass.
    pub fn methods(&self) -> impl Iterator<Item = &BoundOperation> {
        self.members.values().filter_map(|m| match m {
            Member::Method(op) => Some(op),
            Member::Resource(_) => None,
        })
    }

    /// Directly nested resources.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.members.values().filter_map(|m| match m {
            Member::Resource(node) => Some(node),
            Member::Method(_) => None,
        })
    }

    /// Follow a chain of member names below this node.
    pub fn lookup<'a, I>(&self, names: I) -> Option<Attribute<'_>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = names.into_iter().peekable();
        let mut node = self;
        while let Some(name) = names.next() {
            if names.peek().is_none() {
                return node.attribute(name);
            }
            node = node.resource(name)?;
        }
        None
    }
}

impl Namespace for ResourceNode {
    fn owner(&self) -> String {
        format!("resource {}", self.path.join("."))
    }

    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        if name == DESCRIPTOR_KEY {
            return Some(Attribute::Descriptor(&self.descriptor));
        }
        match self.members.get(name) {
            Some(Member::Resource(node)) => Some(Attribute::Resource(node)),
            Some(Member::Method(op)) => Some(Attribute::Method(op)),
            None => self.extras.get(name).map(Attribute::Extra),
        }
    }

    fn extras_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.extras
    }
}

/// Insert a fixed member under its normalized name.
pub(crate) fn insert_member<T>(
    members: &mut IndexMap<String, T>,
    owner: &str,
    raw: &str,
    member: T,
) -> Result<(), SchemaError> {
    let name = normalize_identifier(raw);
    if name == DESCRIPTOR_KEY {
        return Err(SchemaError::ReservedName {
            owner: owner.to_string(),
            name: raw.to_string(),
        });
    }
    if members.contains_key(&name) {
        return Err(SchemaError::DuplicateMember {
            owner: owner.to_string(),
            name,
        });
    }
    members.insert(name, member);
    Ok(())
}
