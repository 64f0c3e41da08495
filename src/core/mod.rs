pub mod descriptor;
pub mod fetcher;
pub mod module;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::aggregate::ResultAggregate;
pub use crate::domain::model::ConfigItem;
pub use crate::domain::ports::{ArbiterModule, Connector, RpcTransport};
pub use crate::utils::error::Result;
