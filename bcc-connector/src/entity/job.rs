//! Job descriptions
//!
//! A job selects data of a memory base through its own conditions, the
//! conditions of its positive events and the negation of its negative events.

use super::event::compile_conditions;
use super::{
    DataGroup, EntityDescriptor, EntityId, Event, MemoryBase, RuleDescription, MB_CHILD,
};
use crate::data::{DataLabel, DataSet};
use crate::fetch::{Pagination, ResourceFetcher};
use crate::filter::{combine, BoolOp, FilterExpr};
use crate::Result;
use serde_json::Value;
use std::collections::BTreeSet;

pub const JOB: EntityDescriptor = EntityDescriptor {
    type_name: "JobDescription",
    base: Some(&MB_CHILD),
    path_template: "jobs/{bcid}",
    fetch_one: "extended",
    fetch_many: "jobs/all/summary",
};

entity_kind!(
    /// Description of a job
    JobDescription,
    JOB
);

/// Events referenced by a job
#[derive(Debug, Clone, Default)]
pub struct JobEvents {
    pub positive: Vec<Event>,
    pub negative: Vec<Event>,
}

fn bcids(items: Option<&Value>) -> Vec<EntityId> {
    match items {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("bcId").and_then(EntityId::from_json))
            .collect(),
        _ => Vec::new(),
    }
}

impl JobDescription {
    pub fn memory_base(&self) -> Result<MemoryBase> {
        self.ancestor()
    }

    /// Fetch the positive and negative events of the job
    pub fn events(&self) -> Result<JobEvents> {
        let memory_base = self.memory_base()?;
        let events = self.metadata().get("events");
        let fetch = |key: &str| -> Result<Vec<Event>> {
            bcids(events.and_then(|e| e.get(key)))
                .iter()
                .map(|id| memory_base.event(id))
                .collect()
        };
        Ok(JobEvents { positive: fetch("positiveEvents")?, negative: fetch("negativeEvents")? })
    }

    /// Categories (model entries) defined for the job
    pub fn categories(&self) -> Vec<Value> {
        match self.metadata().get("modelEntries") {
            Some(Value::Array(entries)) => entries.clone(),
            _ => Vec::new(),
        }
    }

    /// Distinct ids of the variables used by the job
    ///
    /// Includes the variables of the category conditions and of every data
    /// group of the job.
    pub fn variable_ids(&self) -> Result<Vec<EntityId>> {
        let mut ids = BTreeSet::new();
        for entry in self.categories() {
            ids.extend(condition_variables(entry.get("conditions")));
        }

        let groups = bcids(self.metadata().get("dataGroups"));
        if !groups.is_empty() {
            let memory_base = self.memory_base()?;
            for group in groups {
                let group: DataGroup = memory_base.datagroup(group)?;
                ids.extend(group.variable_ids());
            }
        }
        Ok(ids.into_iter().collect())
    }

    /// Compiled job conditions
    ///
    /// With `include_events`, each negative event contributes the negation of
    /// its combined conditions and each positive event its own conditions,
    /// after the job's conditions. With `combine`, the result is merged into
    /// a single AND filter.
    pub fn conditions_with(&self, combine_all: bool, include_events: bool) -> Result<Vec<FilterExpr>> {
        let memory_base = self.memory_base()?;
        let mut filters = compile_conditions(self, &memory_base)?;

        if include_events {
            let events = self.events()?;
            for event in &events.negative {
                if let Some(inner) = combine(event.conditions()?, BoolOp::And).pop() {
                    filters.push(inner.negate());
                }
            }
            for event in &events.positive {
                filters.extend(event.conditions()?);
            }
        }

        Ok(if combine_all { combine(filters, BoolOp::And) } else { filters })
    }

    pub fn conditions(&self) -> Result<Vec<FilterExpr>> {
        self.conditions_with(false, false)
    }

    /// Memory base data selected by the job
    ///
    /// The job's combined conditions and events are appended to `filters`.
    /// The memory base may have changed since the job ran, so this is not
    /// necessarily the data the job was computed on.
    pub fn get_data(&self, mut filters: Vec<FilterExpr>, label: DataLabel) -> Result<DataSet> {
        filters.extend(self.conditions_with(true, true)?);
        let variables = self.variable_ids()?;
        self.memory_base()?.get_data(&variables, filters, label)
    }

    pub fn rule(&self, id: impl Into<EntityId>) -> Result<RuleDescription> {
        self.memory_base()?.rule(id)
    }

    /// Rules attached to the job, listed under the job's own path
    pub fn rule_list(&self, pagination: Pagination) -> Result<Vec<RuleDescription>> {
        ResourceFetcher::new(self).fetch_many(pagination, None)
    }
}

/// `variable.bcId` of each condition of a list
fn condition_variables(conditions: Option<&Value>) -> Vec<EntityId> {
    match conditions {
        Some(Value::Array(conditions)) => conditions
            .iter()
            .filter_map(|c| c.get("variable")?.get("bcId").and_then(EntityId::from_json))
            .collect(),
        _ => Vec::new(),
    }
}
