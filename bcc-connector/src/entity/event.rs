//! Events: named sets of conditions on memory base variables

use super::{Entity, EntityDescriptor, MemoryBase, MB_CHILD};
use crate::filter::{Condition, FilterExpr};
use crate::Result;
use serde_json::Value;
use tracing::debug;

pub const EVENT: EntityDescriptor = EntityDescriptor {
    type_name: "Event",
    base: Some(&MB_CHILD),
    path_template: "events/{bcid}",
    fetch_one: "extended",
    fetch_many: "events/all/extended",
};

entity_kind!(
    /// An event of a memory base
    Event,
    EVENT
);

impl Event {
    pub fn memory_base(&self) -> Result<MemoryBase> {
        self.ancestor()
    }

    /// Compiled filters of the event's conditions
    ///
    /// Each referenced variable is fetched to learn its type; conditions that
    /// constrain nothing are left out.
    pub fn conditions(&self) -> Result<Vec<FilterExpr>> {
        compile_conditions(self, &self.memory_base()?)
    }
}

/// Compile the `conditions` metadata array of an entity
pub(crate) fn compile_conditions(entity: &Entity, memory_base: &MemoryBase) -> Result<Vec<FilterExpr>> {
    let raw = match entity.metadata().get("conditions") {
        Some(Value::Array(raw)) => raw.as_slice(),
        _ => &[],
    };

    let mut filters = Vec::new();
    for condition in raw.iter().filter_map(Condition::from_json) {
        let variable = memory_base.variable(&condition.variable)?;
        if let Some(filter) = variable.build_filter(&condition)? {
            filters.push(filter);
        }
    }
    debug!(entity = ?entity, count = filters.len(), "Compiled conditions");
    Ok(filters)
}
