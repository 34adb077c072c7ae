//! Data groups: named sets of variables

use super::{EntityDescriptor, EntityId, MemoryBase, VariableDescription, MB_CHILD};
use crate::data::{DataLabel, DataSet};
use crate::filter::FilterExpr;
use crate::Result;
use serde_json::Value;

pub const DATAGROUP: EntityDescriptor = EntityDescriptor {
    type_name: "DataGroup",
    base: Some(&MB_CHILD),
    path_template: "dataGroups/{bcid}",
    fetch_one: "extended",
    fetch_many: "dataGroups/summary",
};

entity_kind!(
    /// A group of variables of a memory base
    DataGroup,
    DATAGROUP
);

impl DataGroup {
    pub fn memory_base(&self) -> Result<MemoryBase> {
        self.ancestor()
    }

    /// Ids of the variables listed in the group
    pub fn variable_ids(&self) -> Vec<EntityId> {
        match self.metadata().get("variables") {
            Some(Value::Array(variables)) => variables
                .iter()
                .filter_map(|v| v.get("bcId").and_then(EntityId::from_json))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Fetch the description of every variable of the group
    pub fn variable_list(&self) -> Result<Vec<VariableDescription>> {
        let memory_base = self.memory_base()?;
        self.variable_ids().iter().map(|id| memory_base.variable(id)).collect()
    }

    /// Data of the group's variables
    pub fn get_data(&self, filters: Vec<FilterExpr>, label: DataLabel) -> Result<DataSet> {
        self.memory_base()?.get_data(&self.variable_ids(), filters, label)
    }
}
