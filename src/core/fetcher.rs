use crate::core::descriptor::{
    output_collections, ResolvedDescriptor, SERVICES_COLLECTION, SERVICE_TEMPLATES_COLLECTION,
};
use crate::core::session::LiveSession;
use crate::domain::aggregate::ResultAggregate;
use crate::domain::model::ConfigItem;
use crate::domain::ports::RpcTransport;
use crate::utils::error::{ImportError, Result};
use serde_json::{Map, Value};

pub const DEFAULT_DISCOVERY_METHOD: &str = "monitoring.shinkenTags";

/// 每次請求附帶的選用欄位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// 命名識別（`name` 欄位）
    pub name: Option<String>,
    /// 字元編碼（`encoding` 欄位）
    pub encoding: Option<String>,
    pub discovery_method: String,
}

/// 依 scope 與物件類型表逐一呼叫遠端方法，組出去重後的結果
#[derive(Debug, Clone)]
pub struct EntityFetcher {
    descriptors: Vec<ResolvedDescriptor>,
    scopes: Vec<String>,
    options: FetchOptions,
}

impl EntityFetcher {
    pub fn new(descriptors: Vec<ResolvedDescriptor>, scopes: Vec<String>, options: FetchOptions) -> Self {
        Self {
            descriptors,
            scopes,
            options,
        }
    }

    pub fn descriptors(&self) -> &[ResolvedDescriptor] {
        &self.descriptors
    }

    pub fn configured_scopes(&self) -> &[String] {
        &self.scopes
    }

    /// 結果鍵完整但全部為空
    pub fn empty_aggregate(&self) -> ResultAggregate {
        ResultAggregate::with_collections(output_collections(&self.descriptors))
    }

    pub async fn fetch<T: RpcTransport>(&self, session: Option<LiveSession<'_, T>>) -> ResultAggregate {
        let session = match session {
            Some(session) => session,
            None => {
                tracing::error!("No opened session, I cannot provide any objects to the arbiter.");
                return self.empty_aggregate();
            }
        };

        let scopes = self.resolve_scopes(&session).await;
        if scopes.is_empty() {
            tracing::warn!("No entity scope configured nor discovered, nothing to fetch");
            return self.empty_aggregate();
        }

        let mut aggregate =
            ResultAggregate::with_collections(self.descriptors.iter().map(|d| d.collection.as_str()));

        for scope in &scopes {
            let scope = scope.trim();
            if scope.is_empty() {
                tracing::info!("Getting configuration for all entities");
            } else {
                tracing::info!("Getting configuration for entity tagged with '{}'", scope);
            }

            for descriptor in &self.descriptors {
                if let Err(e) = self
                    .fetch_type(&session, scope, descriptor, &mut aggregate)
                    .await
                {
                    tracing::error!(
                        "Error when getting {} ({}) for tag '{}': {:?} / {}",
                        descriptor.label,
                        descriptor.method,
                        scope,
                        e.category(),
                        e
                    );
                }
            }
        }

        self.log_summary(&aggregate);
        aggregate.merge_templates(SERVICE_TEMPLATES_COLLECTION, SERVICES_COLLECTION);
        aggregate
    }

    /// 未設定 scope 時向遠端查詢，失敗則沿用設定值
    async fn resolve_scopes<T: RpcTransport>(&self, session: &LiveSession<'_, T>) -> Vec<String> {
        let mut scopes = self.scopes.clone();
        if !scopes.is_empty() {
            return scopes;
        }

        let mut params = Map::new();
        params.insert("session".to_string(), Value::from(session.token));
        if let Some(name) = &self.options.name {
            params.insert("name".to_string(), Value::from(name.as_str()));
        }

        tracing::info!("No entity tags configured, discovering them with {}", self.options.discovery_method);
        match session
            .transport
            .call(&self.options.discovery_method, Value::Object(params))
            .await
        {
            Ok(Value::Array(labels)) => {
                for label in labels {
                    match label {
                        Value::String(label) => {
                            if !scopes.contains(&label) {
                                scopes.push(label);
                            }
                        }
                        other => tracing::debug!("Ignoring non-string entity tag: {}", other),
                    }
                }
                tracing::info!("Discovered entities tags: {:?}", scopes);
            }
            Ok(Value::Null) => tracing::info!("No entity tags discovered"),
            Ok(other) => tracing::warn!("Unexpected entity tags response: {}", other),
            Err(e) => tracing::error!(
                "Entity tags discovery failed ({}): {:?} / {}",
                self.options.discovery_method,
                e.category(),
                e
            ),
        }
        scopes
    }

    pub fn request_payload(&self, token: &str, scope: &str) -> Value {
        let mut params = Map::new();
        params.insert("session".to_string(), Value::from(token));
        params.insert("tag".to_string(), Value::from(scope));
        if let Some(name) = &self.options.name {
            params.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(encoding) = &self.options.encoding {
            params.insert("encoding".to_string(), Value::from(encoding.as_str()));
            if is_iso8859(encoding) {
                params.insert("iso8859".to_string(), Value::from("1"));
            }
        }
        Value::Object(params)
    }

    async fn fetch_type<T: RpcTransport>(
        &self,
        session: &LiveSession<'_, T>,
        scope: &str,
        descriptor: &ResolvedDescriptor,
        aggregate: &mut ResultAggregate,
    ) -> Result<()> {
        let reply = session
            .transport
            .call(&descriptor.method, self.request_payload(session.token, scope))
            .await?;

        let items = match reply {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ImportError::protocol(format!(
                    "expected an array of {} items, got {}",
                    descriptor.label,
                    type_name(&other)
                )))
            }
        };

        if items.is_empty() {
            tracing::info!("Got no {}s", descriptor.label);
        } else {
            tracing::info!("Got {} {}s", items.len(), descriptor.label);
        }

        for value in items {
            tracing::debug!("-: {}", value);
            let item = match ConfigItem::from_value(value) {
                Some(item) => item,
                None => {
                    tracing::debug!("Skipping non-struct {} entry", descriptor.label);
                    continue;
                }
            };

            let identifier = item.identifier(descriptor.id_fields);
            if aggregate.insert(&descriptor.collection, item) {
                tracing::info!("- {}: {}", descriptor.label, identifier);
            }
        }
        Ok(())
    }

    fn log_summary(&self, aggregate: &ResultAggregate) {
        tracing::info!("Sending all data to the Arbiter:");
        for descriptor in &self.descriptors {
            tracing::info!(
                "- {} {}s to Arbiter",
                aggregate.len_of(&descriptor.collection),
                descriptor.label
            );
        }
    }
}

fn is_iso8859(encoding: &str) -> bool {
    let normalized: String = encoding
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    normalized.starts_with("iso8859") || normalized == "latin1"
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "struct",
    }
}
