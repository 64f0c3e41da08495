use crate::utils::error::{ImportError, Result};
use std::collections::HashMap;

/// 一種設定物件的遠端擷取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectTypeDescriptor {
    pub type_name: &'static str,
    /// 日誌顯示用名稱
    pub label: &'static str,
    pub method: &'static str,
    pub id_fields: &'static [&'static str],
    /// 未指定時為 `type_name` 加上 `s`
    pub collection: Option<&'static str>,
}

pub const SERVICE_TEMPLATES_COLLECTION: &str = "servicestemplates";
pub const SERVICES_COLLECTION: &str = "services";

/// 擷取順序固定：樣板必須排在服務之前
pub const OBJECT_TYPES: &[ObjectTypeDescriptor] = &[
    ObjectTypeDescriptor {
        type_name: "command",
        label: "command",
        method: "monitoring.shinkenCommands",
        id_fields: &["command_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "contact",
        label: "contact",
        method: "monitoring.shinkenContacts",
        id_fields: &["contact_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "timeperiod",
        label: "timeperiod",
        method: "monitoring.shinkenTimeperiods",
        id_fields: &["timeperiod_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "realm",
        label: "realm",
        method: "monitoring.shinkenRealms",
        id_fields: &["realm_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "host",
        label: "host",
        method: "monitoring.shinkenHosts",
        id_fields: &["host_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "hostgroup",
        label: "hostgroup",
        method: "monitoring.shinkenHostgroups",
        id_fields: &["hostgroup_name"],
        collection: None,
    },
    ObjectTypeDescriptor {
        type_name: "servicestemplate",
        label: "service template",
        method: "monitoring.shinkenTemplates",
        id_fields: &["name"],
        collection: Some(SERVICE_TEMPLATES_COLLECTION),
    },
    ObjectTypeDescriptor {
        type_name: "service",
        label: "service",
        method: "monitoring.shinkenServices",
        id_fields: &["host_name", "service_description"],
        collection: Some(SERVICES_COLLECTION),
    },
];

impl ObjectTypeDescriptor {
    pub fn collection_name(&self) -> String {
        match self.collection {
            Some(collection) => collection.to_string(),
            None => format!("{}s", self.type_name),
        }
    }
}

/// 啟動時解析完成的描述：方法名稱已套用覆寫
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    pub type_name: &'static str,
    pub label: &'static str,
    pub method: String,
    pub id_fields: &'static [&'static str],
    pub collection: String,
}

pub fn find_descriptor(type_name: &str) -> Option<&'static ObjectTypeDescriptor> {
    OBJECT_TYPES.iter().find(|d| d.type_name == type_name)
}

/// 套用方法覆寫，覆寫了不存在的類型時回傳錯誤
pub fn resolve_descriptors(overrides: &HashMap<String, String>) -> Result<Vec<ResolvedDescriptor>> {
    for type_name in overrides.keys() {
        if find_descriptor(type_name).is_none() {
            return Err(ImportError::InvalidConfigValueError {
                field: format!("methods.{}", type_name),
                value: type_name.clone(),
                reason: format!(
                    "Unknown object type. Valid types: {}",
                    OBJECT_TYPES
                        .iter()
                        .map(|d| d.type_name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
    }

    Ok(OBJECT_TYPES
        .iter()
        .map(|descriptor| {
            let method = overrides
                .get(descriptor.type_name)
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .unwrap_or(descriptor.method)
                .to_string();

            ResolvedDescriptor {
                type_name: descriptor.type_name,
                label: descriptor.label,
                method,
                id_fields: descriptor.id_fields,
                collection: descriptor.collection_name(),
            }
        })
        .collect())
}

/// 最終結果中會出現的集合（樣板集合已併入服務）
pub fn output_collections(descriptors: &[ResolvedDescriptor]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for descriptor in descriptors {
        let name = descriptor.collection.as_str();
        if name != SERVICE_TEMPLATES_COLLECTION && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
