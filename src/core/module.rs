use crate::adapters::xmlrpc::XmlRpcConnector;
use crate::config::import_config::ImportConfig;
use crate::core::descriptor::resolve_descriptors;
use crate::core::fetcher::EntityFetcher;
use crate::core::session::{ConnectionState, SessionManager};
use crate::domain::aggregate::ResultAggregate;
use crate::domain::ports::{ArbiterModule, Connector};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use async_trait::async_trait;

/// 提供給模組管理器的模組屬性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleProperties {
    pub daemons: &'static [&'static str],
    pub module_type: &'static str,
    pub external: bool,
    pub phases: &'static [&'static str],
}

pub const PROPERTIES: ModuleProperties = ModuleProperties {
    daemons: &["arbiter"],
    module_type: "import-glpi",
    external: false,
    phases: &["configuration"],
};

/// Arbiter 模組：連線管理加上實體擷取
pub struct ImportModule<C: Connector> {
    alias: String,
    session: SessionManager<C>,
    fetcher: EntityFetcher,
}

impl ImportModule<XmlRpcConnector> {
    pub fn from_config(config: &ImportConfig) -> Result<Self> {
        let connector = XmlRpcConnector::new(config.timeout(), config.verbose);
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> ImportModule<C> {
    pub fn with_connector(config: &ImportConfig, connector: C) -> Result<Self> {
        config.validate()?;
        let descriptors = resolve_descriptors(&config.methods)?;
        let scopes = config.scopes();

        tracing::info!(
            "Give an instance of {} for alias: {}",
            PROPERTIES.module_type,
            config.alias
        );
        tracing::info!("configured GLPI uri: {}", config.uri);
        tracing::info!("configured entities tags: {:?}", scopes);

        Ok(Self {
            alias: config.alias.clone(),
            session: SessionManager::new(
                connector,
                config.uri.clone(),
                config.credentials(),
                config.login_method.clone(),
            ),
            fetcher: EntityFetcher::new(descriptors, scopes, config.fetch_options()),
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn properties(&self) -> ModuleProperties {
        PROPERTIES
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionManager<C> {
        &self.session
    }

    pub fn fetcher(&self) -> &EntityFetcher {
        &self.fetcher
    }
}

#[async_trait]
impl<C: Connector> ArbiterModule for ImportModule<C> {
    async fn init(&mut self) -> bool {
        // 未設定端點時回傳 true，否則模組管理器會不斷重新載入
        let state = self.session.connect().await;
        tracing::info!("[{}] module state: {:?}", self.alias, state);
        state != ConnectionState::Failed
    }

    async fn get_objects(&self) -> ResultAggregate {
        let aggregate = self.fetcher.fetch(self.session.live()).await;
        tracing::info!(
            "[{}] providing {} objects to the arbiter",
            self.alias,
            aggregate.total_items()
        );
        aggregate
    }
}
