//! Child resource fetching and transparent pagination
//!
//! A [`ResourceFetcher`] is bound to a parent entity. It builds the request
//! path and the bound entity path of a child kind from the parent path and the
//! kind's descriptor, performs the request(s) and wraps the constructed
//! entities. Collections are requested page by page with `offset` / `size`
//! until an empty page comes back, or once when a single page was asked for.

use crate::entity::{Entity, EntityId, EntityKind};
use crate::path::{compose_paths, resolve_webservice, with_page_query, ID_PLACEHOLDER};
use crate::transport::Method;
use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Which page(s) of a collection to fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// `None` fetches every page
    pub page: Option<usize>,
    /// `None` uses the `page_size` parameter
    pub page_size: Option<usize>,
}

impl Pagination {
    /// Every page, with the configured page size
    pub fn all() -> Self {
        Self::default()
    }

    /// One page, zero-based
    pub fn page(page: usize) -> Self {
        Self { page: Some(page), page_size: None }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Fetches the children of one parent entity
pub struct ResourceFetcher<'a> {
    parent: &'a Entity,
}

impl<'a> ResourceFetcher<'a> {
    pub fn new(parent: &'a Entity) -> Self {
        Self { parent }
    }

    fn request(&self, path: &str) -> Result<Value> {
        let client = self.parent.client();
        client.request_ws(Method::Get, &resolve_webservice(path), None, &self.parent.braincube_name())
    }

    /// Fetch one child from its id
    ///
    /// `subpath` overrides the kind's default fetch-one suffix.
    pub fn fetch_one<K: EntityKind>(&self, id: impl Into<EntityId>, subpath: Option<&str>) -> Result<K> {
        let descriptor = K::DESCRIPTOR;
        let id = id.into();
        let relative = descriptor.path_template.replace(ID_PLACEHOLDER, &id.to_string());
        let (request_path, entity_path) = compose_paths(
            self.parent.path(),
            &relative,
            subpath.unwrap_or(descriptor.fetch_one),
            false,
        );

        debug!(kind = descriptor.type_name, id = %id, path = %request_path, "Fetching entity");
        let json = self.request(&request_path)?;
        let entity = Entity::construct_from_json(self.parent.client(), descriptor, json, &entity_path, Some(self.parent))?;
        Ok(K::from_entity(entity))
    }

    /// Fetch a collection of children
    ///
    /// `subpath` overrides the kind's default fetch-many suffix. With
    /// `page: None` every page is requested in turn, including the final empty
    /// one that ends the loop.
    pub fn fetch_many<K: EntityKind>(&self, pagination: Pagination, subpath: Option<&str>) -> Result<Vec<K>> {
        let descriptor = K::DESCRIPTOR;
        let (request_path, entity_path) = compose_paths(
            self.parent.path(),
            descriptor.path_template,
            subpath.unwrap_or(descriptor.fetch_many),
            true,
        );

        let page_size = pagination
            .page_size
            .unwrap_or_else(|| self.parent.client().params().page_size());
        let mut offset = first_offset(pagination.page, page_size)?;
        let mut entities = Vec::new();

        loop {
            let json = self.request(&with_page_query(&request_path, offset, page_size))?;
            let items = page_items(json)?;
            debug!(
                kind = descriptor.type_name,
                offset,
                size = page_size,
                received = items.len(),
                "Fetched page"
            );

            let batch_empty = items.is_empty();
            for item in items {
                let entity = Entity::construct_from_json(
                    self.parent.client(),
                    descriptor,
                    item,
                    &entity_path,
                    Some(self.parent),
                )?;
                entities.push(K::from_entity(entity));
            }

            if batch_empty || pagination.page.is_some() {
                break;
            }
            offset = offset.checked_add(page_size).ok_or_else(|| offset_overflow(offset, page_size))?;
        }

        Ok(entities)
    }
}

/// Offset of the first requested page; the page size must be positive
fn first_offset(page: Option<usize>, page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(Error::InvalidParameter("page size must be at least 1".to_string()));
    }
    match page {
        None => Ok(0),
        Some(page) => page.checked_mul(page_size).ok_or_else(|| offset_overflow(page, page_size)),
    }
}

fn offset_overflow(base: usize, page_size: usize) -> Error {
    Error::InvalidParameter(format!("page offset overflows at {base} with page size {page_size}"))
}

/// Items of one collection page; a page without `items` is empty
fn page_items(json: Value) -> Result<Vec<Value>> {
    match json {
        Value::Object(mut map) => match map.remove("items") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(Error::malformed(&other.to_string())),
        },
        other => Err(Error::malformed(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_constructors() {
        assert_eq!(Pagination::all(), Pagination { page: None, page_size: None });
        assert_eq!(
            Pagination::page(2).with_page_size(5),
            Pagination { page: Some(2), page_size: Some(5) }
        );
    }

    #[test]
    fn test_first_offset() {
        assert_eq!(first_offset(None, 150).unwrap(), 0);
        assert_eq!(first_offset(Some(3), 50).unwrap(), 150);
        assert!(matches!(first_offset(None, 0), Err(Error::InvalidParameter(_))));
        assert!(matches!(first_offset(Some(1), 0), Err(Error::InvalidParameter(_))));
        assert!(matches!(first_offset(Some(usize::MAX), 2), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_page_items() {
        assert_eq!(page_items(json!({"items": [1, 2]})).unwrap(), vec![json!(1), json!(2)]);
        assert!(page_items(json!({"items": []})).unwrap().is_empty());
        assert!(page_items(json!({})).unwrap().is_empty());
        assert!(page_items(json!({"items": "x"})).is_err());
        assert!(page_items(json!([1])).is_err());
    }
}
