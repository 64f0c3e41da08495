use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 遠端回傳的一筆設定物件，欄位原樣保留
///
/// 欄位以 `BTreeMap` 保存，鍵值有序，因此兩筆欄位相同的物件不論
/// 遠端回傳的順序如何，都會得到同一個標準表示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigItem {
    pub data: BTreeMap<String, Value>,
}

/// 標記樣板物件的欄位
pub const REGISTER_FIELD: &str = "register";
/// 樣板物件用來命名的欄位
pub const TEMPLATE_NAME_FIELD: &str = "name";

impl ConfigItem {
    pub fn new(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }

    /// 從 JSON 物件建立，非物件回傳 None
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self::new(obj.into_iter().collect())),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// `register` 為 "0"、0 或 false 時視為樣板
    pub fn is_template(&self) -> bool {
        match self.data.get(REGISTER_FIELD) {
            Some(Value::String(s)) => s.trim() == "0",
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            Some(Value::Bool(b)) => !b,
            _ => false,
        }
    }

    /// 日誌用的識別名稱；樣板取 `name`，其他取指定欄位並以 `/` 連接
    pub fn identifier(&self, id_fields: &[&str]) -> String {
        if self.is_template() {
            if let Some(name) = self.data.get(TEMPLATE_NAME_FIELD) {
                return display_value(name);
            }
        }

        let parts: Vec<String> = id_fields
            .iter()
            .filter_map(|field| self.data.get(*field).map(display_value))
            .collect();

        if parts.is_empty() {
            "<unnamed>".to_string()
        } else {
            parts.join("/")
        }
    }

    /// 標準比較表示：欄位依鍵排序後的 JSON 字串，巢狀物件亦同
    ///
    /// 巢狀物件的鍵需自行排序：依賴圖中其他 crate 可能啟用 serde_json 的
    /// `preserve_order`，此時 `Map` 會保留遠端順序。
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        out.push('{');
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&Value::String(key.clone()).to_string());
            out.push(':');
            write_canonical(value, &mut out);
        }
        out.push('}');
        out
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
