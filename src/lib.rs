pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::ImportConfig;

pub use crate::adapters::{XmlRpcClient, XmlRpcConnector};
pub use crate::core::fetcher::{EntityFetcher, FetchOptions};
pub use crate::core::module::{ImportModule, PROPERTIES};
pub use crate::core::session::{ConnectionState, Credentials, SessionManager};
pub use crate::domain::aggregate::ResultAggregate;
pub use crate::domain::model::ConfigItem;
pub use crate::domain::ports::{ArbiterModule, Connector, RpcTransport};
pub use crate::utils::error::{ImportError, Result};
