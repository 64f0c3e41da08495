use crate::domain::ports::{Connector, RpcTransport};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockReply {
    Value(Value),
    Fault(i64, String),
    HttpStatus(u16),
}

/// 依方法名稱（可再依 tag 區分）回傳預先設定的結果，並記錄每次呼叫
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<(String, Option<String>), MockReply>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, value: Value) {
        self.set(method, None, MockReply::Value(value));
    }

    pub fn reply_for_tag(&self, method: &str, tag: &str, value: Value) {
        self.set(method, Some(tag), MockReply::Value(value));
    }

    pub fn fault(&self, method: &str, code: i64, message: &str) {
        self.set(method, None, MockReply::Fault(code, message.to_string()));
    }

    pub fn fault_for_tag(&self, method: &str, tag: &str, code: i64, message: &str) {
        self.set(method, Some(tag), MockReply::Fault(code, message.to_string()));
    }

    pub fn http_error(&self, method: &str, status: u16) {
        self.set(method, None, MockReply::HttpStatus(status));
    }

    fn set(&self, method: &str, tag: Option<&str>, reply: MockReply) {
        self.replies
            .lock()
            .unwrap()
            .insert((method.to_string(), tag.map(str::to_string)), reply);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        let tag = params.get("tag").and_then(Value::as_str).map(str::to_string);
        let reply = {
            let replies = self.replies.lock().unwrap();
            replies
                .get(&(method.to_string(), tag))
                .or_else(|| replies.get(&(method.to_string(), None)))
                .cloned()
        };

        // 未設定的方法視同伺服器不支援
        match reply {
            Some(MockReply::Value(value)) => Ok(value),
            Some(MockReply::Fault(code, message)) => Err(ImportError::Fault { code, message }),
            Some(MockReply::HttpStatus(status)) => Err(ImportError::HttpStatus { status }),
            None => Err(ImportError::Fault {
                code: -32601,
                message: format!("method '{}' not found", method),
            }),
        }
    }
}

pub struct MockConnector {
    pub transport: Arc<MockTransport>,
    pub opened: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport,
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl Connector for MockConnector {
    type Transport = Arc<MockTransport>;

    fn open(&self, endpoint: &str) -> Result<Arc<MockTransport>> {
        crate::utils::validation::validate_url("uri", endpoint)?;
        self.opened.lock().unwrap().push(endpoint.to_string());
        Ok(Arc::clone(&self.transport))
    }
}
