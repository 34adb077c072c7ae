//! Entity model
//!
//! Every fetchable resource is an [`Entity`]: an id, the raw metadata object
//! returned by the service, the path it is bound to and a non-owning handle on
//! the entity that produced it. Resource kinds differ only by their static
//! [`EntityDescriptor`] and by the typed accessors of their wrapper.
//!
//! # Field keys
//!
//! The metadata keys holding the id and display name are read from the
//! [`Params`] store at lookup time, walking the descriptor chain
//! (concrete type → declared base → universal default).

use crate::client::Client;
use crate::params::{FieldRole, Params};
use crate::path::{cube_prefix, ID_PLACEHOLDER};
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};

/// Static metadata of a resource kind
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Name used in field-key parameters (`<type_name>_name_key`)
    pub type_name: &'static str,
    /// Declared base kind, consulted when this kind has no field key
    pub base: Option<&'static EntityDescriptor>,
    /// Path relative to the parent, containing `{bcid}`
    pub path_template: &'static str,
    /// Default suffix requesting one entity
    pub fetch_one: &'static str,
    /// Default suffix requesting a page of entities
    pub fetch_many: &'static str,
}

impl EntityDescriptor {
    /// This descriptor followed by its bases
    pub fn ancestry(&'static self) -> impl Iterator<Item = &'static EntityDescriptor> {
        std::iter::successors(Some(self), |descriptor| descriptor.base)
    }

    pub fn is(&self, other: &EntityDescriptor) -> bool {
        self.type_name == other.type_name
    }
}

/// Root of every descriptor chain
pub const BASE_ENTITY: EntityDescriptor = EntityDescriptor {
    type_name: "BaseEntity",
    base: None,
    path_template: "",
    fetch_one: "",
    fetch_many: "",
};

/// Shared base of the resources living under a memory base
pub const MB_CHILD: EntityDescriptor = EntityDescriptor {
    type_name: "MbChild",
    base: Some(&BASE_ENTITY),
    path_template: "",
    fetch_one: "",
    fetch_many: "",
};

/// Resolve the metadata key of a field for a descriptor chain
pub fn resolve_field_key(params: &Params, descriptor: &'static EntityDescriptor, role: FieldRole) -> String {
    descriptor
        .ancestry()
        .find_map(|d| params.field_key(d.type_name, role))
        .unwrap_or_else(|| role.universal_default().to_string())
}

/// A typed resource kind
///
/// The fetcher is generic over this trait: it reads the descriptor to build
/// paths and wraps each constructed [`Entity`].
pub trait EntityKind: Sized {
    const DESCRIPTOR: &'static EntityDescriptor;

    fn from_entity(entity: Entity) -> Self;

    fn entity(&self) -> &Entity;
}

/// Wrapper type for one resource kind, dereferencing to [`Entity`]
macro_rules! entity_kind {
    ($(#[$meta:meta])* $name:ident, $descriptor:expr) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(crate::entity::Entity);

        impl crate::entity::EntityKind for $name {
            const DESCRIPTOR: &'static crate::entity::EntityDescriptor = &$descriptor;

            fn from_entity(entity: crate::entity::Entity) -> Self {
                Self(entity)
            }

            fn entity(&self) -> &crate::entity::Entity {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::entity::Entity;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.0, f)
            }
        }
    };
}

mod cube;
mod datagroup;
mod event;
mod job;
mod memory_base;
mod rule;
mod variable;

pub use cube::Cube;
pub use datagroup::DataGroup;
pub use event::Event;
pub use job::{JobDescription, JobEvents};
pub use memory_base::MemoryBase;
pub use rule::RuleDescription;
pub use variable::VariableDescription;

/// Identifier of an entity, unique within its type and parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Read an id out of a JSON scalar
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) => Some(EntityId::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EntityId::Int(i) => Value::from(*i),
            EntityId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(i) => write!(f, "{}", i),
            EntityId::Str(s) => write!(f, "{}", s),
        }
    }
}

macro_rules! id_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for EntityId {
            fn from(value: $t) -> Self {
                EntityId::Int(value as i64)
            }
        })*
    };
}
id_from_int!(i32, i64, u32, u64);

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Str(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Str(value)
    }
}

impl From<&String> for EntityId {
    fn from(value: &String) -> Self {
        EntityId::Str(value.clone())
    }
}

impl From<&EntityId> for EntityId {
    fn from(value: &EntityId) -> Self {
        value.clone()
    }
}

struct EntityInner {
    descriptor: &'static EntityDescriptor,
    id: EntityId,
    name: String,
    metadata: Value,
    path: String,
    braincube_name: Option<String>,
    parent: Option<Weak<EntityInner>>,
    client: Arc<Client>,
}

/// A fetched resource
///
/// Cheap to clone; immutable after construction.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} name=\"{}\" id={} path=\"{}\">",
            self.inner.descriptor.type_name, self.inner.name, self.inner.id, self.inner.path
        )
    }
}

fn field_text(metadata: &Value, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl Entity {
    /// Build an entity from one raw JSON object
    ///
    /// The id and name are read with the live field keys of the descriptor
    /// chain; `{bcid}` in `entity_path` is replaced by the id. The tenant name
    /// of the parent is copied, so it outlives the parent.
    pub fn construct_from_json(
        client: &Arc<Client>,
        descriptor: &'static EntityDescriptor,
        raw: Value,
        entity_path: &str,
        parent: Option<&Entity>,
    ) -> Result<Self> {
        let params = client.params();
        let id_key = resolve_field_key(params, descriptor, FieldRole::Id);
        let name_key = resolve_field_key(params, descriptor, FieldRole::Name);

        let id = raw
            .get(&id_key)
            .and_then(EntityId::from_json)
            .ok_or_else(|| Error::MissingField { entity: descriptor.type_name, field: id_key })?;
        let name = field_text(&raw, &name_key)
            .ok_or_else(|| Error::MissingField { entity: descriptor.type_name, field: name_key })?;

        let path = entity_path.replacen(ID_PLACEHOLDER, &id.to_string(), 1);

        Ok(Self {
            inner: Arc::new(EntityInner {
                descriptor,
                id,
                name,
                metadata: raw,
                path,
                braincube_name: parent.map(Entity::braincube_name).filter(|name| !name.is_empty()),
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                client: Arc::clone(client),
            }),
        })
    }

    /// Build a root entity that carries its own tenant name
    pub(crate) fn new_root(
        client: &Arc<Client>,
        descriptor: &'static EntityDescriptor,
        id: EntityId,
        name: String,
        metadata: Value,
        path: String,
    ) -> Self {
        Self {
            inner: Arc::new(EntityInner {
                descriptor,
                id,
                braincube_name: Some(name.clone()),
                name,
                metadata,
                path,
                parent: None,
                client: Arc::clone(client),
            }),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.inner.id
    }

    /// Name read when the entity was constructed
    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    /// Raw metadata returned by the service
    pub fn metadata(&self) -> &Value {
        &self.inner.metadata
    }

    /// Path the entity is bound to; may still contain `{webservice}`
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.inner.descriptor
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.inner.client
    }

    /// Name read now with the currently configured name key
    pub fn get_name(&self) -> Result<String> {
        let key = resolve_field_key(self.inner.client.params(), self.inner.descriptor, FieldRole::Name);
        field_text(&self.inner.metadata, &key).ok_or(Error::MissingField {
            entity: self.inner.descriptor.type_name,
            field: key,
        })
    }

    /// Second part of the `uuid` metadata field (`<prefix>_<uuid>`)
    pub fn uuid(&self) -> Option<String> {
        let uuid = self.inner.metadata.get("uuid")?.as_str()?;
        uuid.split('_').nth(1).map(str::to_string)
    }

    /// The entity that produced this one, if still alive
    pub fn parent(&self) -> Option<Entity> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Entity { inner })
    }

    /// Tenant name, own or inherited through the parent chain
    pub fn braincube_name(&self) -> String {
        let mut current = Some(self.clone());
        while let Some(entity) = current {
            if let Some(name) = entity.inner.braincube_name.as_ref().filter(|n| !n.is_empty()) {
                return name.clone();
            }
            current = entity.parent();
        }
        String::new()
    }

    /// Cube part of the bound path (before `{webservice}`)
    pub fn braincube_path(&self) -> &str {
        cube_prefix(&self.inner.path)
    }

    /// Nearest ancestor of a given kind
    pub fn ancestor<K: EntityKind>(&self) -> Result<K> {
        let mut link = self.inner.parent.clone();
        while let Some(weak) = link {
            let inner = weak.upgrade().ok_or(Error::ParentDropped)?;
            if inner.descriptor.is(K::DESCRIPTOR) {
                return Ok(K::from_entity(Entity { inner }));
            }
            link = inner.parent.clone();
        }
        Err(Error::ParentDropped)
    }
}
