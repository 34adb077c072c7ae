//! Variable: a typed column of a memory base

use super::{EntityDescriptor, MemoryBase, MB_CHILD};
use crate::data::expand_var_id;
use crate::filter::{compile_condition, Condition, FilterExpr, FilterTarget, VariableType};
use crate::Result;

pub const VARIABLE: EntityDescriptor = EntityDescriptor {
    type_name: "VariableDescription",
    base: Some(&MB_CHILD),
    path_template: "variables/{bcid}",
    fetch_one: "extended",
    fetch_many: "variables/summary",
};

entity_kind!(
    /// Description of one variable
    VariableDescription,
    VARIABLE
);

impl VariableDescription {
    pub fn memory_base(&self) -> Result<MemoryBase> {
        self.ancestor()
    }

    /// Declared type, from the `type` metadata field
    pub fn var_type(&self) -> VariableType {
        self.metadata()
            .get("type")
            .and_then(|t| t.as_str())
            .map(VariableType::from)
            .unwrap_or_default()
    }

    /// `mb<memory_base_id>/d<variable_id>`
    pub fn long_id(&self) -> Result<String> {
        let memory_base = self.memory_base()?;
        Ok(expand_var_id(&memory_base.long_id(), self.id()))
    }

    pub fn filter_target(&self) -> Result<FilterTarget> {
        Ok(FilterTarget { long_id: self.long_id()?, var_type: self.var_type() })
    }

    /// Compile a condition on this variable; `None` when it filters nothing
    pub fn build_filter(&self, condition: &Condition) -> Result<Option<FilterExpr>> {
        Ok(compile_condition(&self.filter_target()?, condition))
    }
}
