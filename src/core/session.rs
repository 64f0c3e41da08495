use crate::domain::ports::{Connector, RpcTransport};
use crate::utils::error::{ImportError, Result};
use serde_json::{json, Value};

pub const DEFAULT_LOGIN_METHOD: &str = "glpi.doLogin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login_name: String,
    pub login_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    /// 未設定端點，模組停用
    Disabled,
    Connected,
    Failed,
}

/// 已登入的連線：傳輸層與 session token
#[derive(Debug)]
pub struct LiveSession<'a, T> {
    pub transport: &'a T,
    pub token: &'a str,
}

/// 持有唯一的已驗證 session
pub struct SessionManager<C: Connector> {
    connector: C,
    endpoint: String,
    credentials: Credentials,
    login_method: String,
    transport: Option<C::Transport>,
    token: Option<String>,
    state: ConnectionState,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(
        connector: C,
        endpoint: impl Into<String>,
        credentials: Credentials,
        login_method: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            endpoint: endpoint.into(),
            credentials,
            login_method: login_method.into(),
            transport: None,
            token: None,
            state: ConnectionState::Uninitialized,
        }
    }

    /// 建立連線並登入；每次呼叫都會先清除先前的 session
    pub async fn connect(&mut self) -> ConnectionState {
        self.transport = None;
        self.token = None;

        let endpoint = self.endpoint.trim().to_string();
        if endpoint.is_empty() {
            tracing::info!("No Glpi WS uri configured, the module is disabled");
            self.state = ConnectionState::Disabled;
            return self.state;
        }

        tracing::info!("Connecting to {}", endpoint);
        self.state = match self.login(&endpoint).await {
            Ok((transport, token)) => {
                tracing::info!("Authenticated as '{}'", self.credentials.login_name);
                tracing::debug!("Session: {}", token);
                self.transport = Some(transport);
                self.token = Some(token);
                ConnectionState::Connected
            }
            Err(e) => {
                tracing::error!(
                    "Glpi WS connection error ({:?}): {}",
                    e.category(),
                    e
                );
                ConnectionState::Failed
            }
        };
        self.state
    }

    async fn login(&self, endpoint: &str) -> Result<(C::Transport, String)> {
        let transport = self.connector.open(endpoint)?;
        tracing::info!("Connection opened, authentication in progress...");

        let params = json!({
            "login_name": self.credentials.login_name,
            "login_password": self.credentials.login_password,
        });
        let reply = transport.call(&self.login_method, params).await?;

        let token = reply
            .get("session")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ImportError::protocol(format!(
                    "{} response carries no session token",
                    self.login_method
                ))
            })?
            .to_string();

        Ok((transport, token))
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn live(&self) -> Option<LiveSession<'_, C::Transport>> {
        match (&self.transport, &self.token) {
            (Some(transport), Some(token)) => Some(LiveSession {
                transport,
                token: token.as_str(),
            }),
            _ => None,
        }
    }
}
