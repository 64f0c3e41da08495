use crate::domain::aggregate::ResultAggregate;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// 以名稱呼叫遠端程序的統一介面
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        (**self).call(method, params).await
    }
}

/// 依端點建立傳輸連線
pub trait Connector: Send + Sync {
    type Transport: RpcTransport;

    fn open(&self, endpoint: &str) -> Result<Self::Transport>;
}

/// 主控端（arbiter）呼叫的模組生命週期
#[async_trait]
pub trait ArbiterModule: Send + Sync {
    /// 回傳 false 代表真正的連線失敗；未設定端點仍回傳 true
    async fn init(&mut self) -> bool;

    async fn get_objects(&self) -> ResultAggregate;
}
