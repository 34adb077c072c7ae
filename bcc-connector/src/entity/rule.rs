//! Rule descriptions

use super::{EntityDescriptor, MemoryBase, MB_CHILD};
use crate::Result;

pub const RULE: EntityDescriptor = EntityDescriptor {
    type_name: "RuleDescription",
    base: Some(&MB_CHILD),
    path_template: "rules/{bcid}",
    fetch_one: "summary",
    fetch_many: "rules/all/summary",
};

entity_kind!(
    /// Description of a rule
    RuleDescription,
    RULE
);

impl RuleDescription {
    pub fn memory_base(&self) -> Result<MemoryBase> {
        self.ancestor()
    }
}
