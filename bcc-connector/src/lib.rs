//! # Braincube Connector
//!
//! Client library for the Braincube analytics web services:
//! - Authentication (API key or OAuth2 session) and cube discovery
//! - Navigation of the resource tree (cube → memory base → variables,
//!   events, data groups, jobs, rules) with transparent pagination
//! - Compilation of declarative conditions into service filters
//! - Typed data collection from the braindata service
//!
//! All requests are blocking and go through a [`transport::Transport`].

pub mod auth;
pub mod client;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod params;
pub mod path;
pub mod transport;

pub use client::{Client, ClientSlot};
pub use config::ConnectorConfig;
pub use data::{Column, DataLabel, DataSet};
pub use entity::{
    Cube, DataGroup, Entity, EntityId, Event, JobDescription, JobEvents, MemoryBase, RuleDescription,
    VariableDescription,
};
pub use error::{Error, Result};
pub use fetch::Pagination;
pub use filter::{combine, compile_condition, BoolOp, Condition, FilterExpr};
pub use params::Params;
