//! Cube: the tenant-scoped root of the resource tree

use super::{Entity, EntityDescriptor, EntityId, EntityKind, MemoryBase, BASE_ENTITY};
use crate::client::{Client, CubeInfo};
use crate::fetch::{Pagination, ResourceFetcher};
use crate::path::join_path;
use crate::Result;
use std::sync::Arc;

/// Path segment under which cubes are addressed when the API base URL has no
/// tenant placeholder
pub const CUBE_SEGMENT: &str = "braincube";

pub const CUBE: EntityDescriptor = EntityDescriptor {
    type_name: "Braincube",
    base: Some(&BASE_ENTITY),
    path_template: "braincube/{bcid}",
    fetch_one: "",
    fetch_many: "",
};

entity_kind!(
    /// A named analytics workspace
    Cube,
    CUBE
);

impl Cube {
    /// Build a cube from the SSO access list entry
    ///
    /// Cubes are not fetched: their id is their name, and their path is empty
    /// when the tenant is carried by the base URL.
    pub(crate) fn from_info(client: &Arc<Client>, info: &CubeInfo) -> Self {
        let path = if client.has_placeholder_in_braincube_url() {
            String::new()
        } else {
            join_path(&[CUBE_SEGMENT, info.name.as_str()])
        };
        let entity = Entity::new_root(
            client,
            Self::DESCRIPTOR,
            EntityId::Str(info.name.clone()),
            info.name.clone(),
            info.metadata.clone(),
            path,
        );
        Self::from_entity(entity)
    }

    /// Product id of the cube
    pub fn product_id(&self) -> Option<String> {
        let product = self.metadata().get("product")?;
        match product.get("productId")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// A cube is identified across services by its product id
    pub fn uuid(&self) -> Option<String> {
        self.product_id()
    }

    pub fn memory_base(&self, id: impl Into<EntityId>) -> Result<MemoryBase> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn memory_base_list(&self, pagination: Pagination) -> Result<Vec<MemoryBase>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }
}
