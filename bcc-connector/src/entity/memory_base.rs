//! Memory base: a dataset container and the parent of every data resource

use super::{
    DataGroup, EntityDescriptor, EntityId, Event, JobDescription, RuleDescription,
    VariableDescription, BASE_ENTITY,
};
use crate::data::{self, DataLabel, DataSet};
use crate::fetch::{Pagination, ResourceFetcher};
use crate::filter::FilterExpr;
use crate::path::{join_path, resolve_webservice};
use crate::transport::Method;
use crate::{Error, Result};
use serde_json::Value;
use tracing::debug;

pub const MEMORY_BASE: EntityDescriptor = EntityDescriptor {
    type_name: "MemoryBase",
    base: Some(&BASE_ENTITY),
    path_template: "{webservice}/mb/{bcid}",
    fetch_one: "extended",
    fetch_many: "{webservice}/mb/all/summary",
};

/// Memory bases list their rules through the selector endpoint
const RULE_SELECTOR_PATH: &str = "rules/all/selector";

const BRAINDATA_INFO_PATH: &str = "braindata/{mb_id}/simple";

entity_kind!(
    /// A dataset within a cube
    MemoryBase,
    MEMORY_BASE
);

impl MemoryBase {
    /// Memory base id prefixed with `mb`, as used by the data service
    pub fn long_id(&self) -> String {
        data::long_mb_id(self.id())
    }

    pub fn variable(&self, id: impl Into<EntityId>) -> Result<VariableDescription> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn variable_list(&self, pagination: Pagination) -> Result<Vec<VariableDescription>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }

    pub fn event(&self, id: impl Into<EntityId>) -> Result<Event> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn event_list(&self, pagination: Pagination) -> Result<Vec<Event>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }

    pub fn datagroup(&self, id: impl Into<EntityId>) -> Result<DataGroup> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn datagroup_list(&self, pagination: Pagination) -> Result<Vec<DataGroup>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }

    pub fn job(&self, id: impl Into<EntityId>) -> Result<JobDescription> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn job_list(&self, pagination: Pagination) -> Result<Vec<JobDescription>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }

    pub fn rule(&self, id: impl Into<EntityId>) -> Result<RuleDescription> {
        ResourceFetcher::new(self).fetch_one(id, None)
    }

    pub fn rule_list(&self, pagination: Pagination) -> Result<Vec<RuleDescription>> {
        ResourceFetcher::new(self).fetch_many(pagination, Some(RULE_SELECTOR_PATH))
    }

    /// Fully qualified id of the order (reference date) variable
    ///
    /// Not cached: the memory base description is requested again on every
    /// call.
    pub fn order_variable_long_id(&self) -> Result<String> {
        let path = join_path(&[self.path(), MEMORY_BASE.fetch_one]);
        let fresh = self.client().request_ws(
            Method::Get,
            &resolve_webservice(&path),
            None,
            &self.braincube_name(),
        )?;
        let order = data::order_variable_id(&fresh).ok_or_else(|| Error::MissingOrderVariable {
            memory_base: self.id().to_string(),
        })?;
        debug!(memory_base = %self.id(), order = %order, "Resolved order variable");
        Ok(data::expand_var_id(&self.long_id(), &order))
    }

    /// Summary of the memory base as seen by the data service
    pub fn braindata_info(&self) -> Result<Value> {
        let info_path = BRAINDATA_INFO_PATH.replace("{mb_id}", &self.long_id());
        let path = join_path(&[self.braincube_path(), info_path.as_str()]);
        self.client()
            .request_ws(Method::Get, &path, None, &self.braincube_name())
    }

    /// Data of the given variables, optionally filtered
    pub fn get_data(
        &self,
        variable_ids: &[EntityId],
        filters: Vec<FilterExpr>,
        label: DataLabel,
    ) -> Result<DataSet> {
        data::collect_data(self, variable_ids, filters, label)
    }
}
