use crate::core::descriptor::find_descriptor;
use crate::core::fetcher::{FetchOptions, DEFAULT_DISCOVERY_METHOD};
use crate::core::session::{Credentials, DEFAULT_LOGIN_METHOD};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ALIAS: &str = "import-glpi";

/// 代表「所有實體」的 scope 寫法
pub const ALL_ENTITIES_TAG: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub alias: String,
    /// 空字串代表停用模組
    pub uri: String,
    pub login_name: String,
    pub login_password: String,
    pub encoding: Option<String>,
    pub verbose: bool,
    pub name: Option<String>,
    /// 逗號分隔的實體標籤，空白代表向遠端查詢
    pub tags: String,
    /// 舊版單一標籤設定，仍然支援
    pub tag: String,
    pub login_method: String,
    pub discovery_method: String,
    pub timeout_seconds: Option<u64>,
    /// 物件類型 → 遠端方法名稱
    pub methods: HashMap<String, String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            uri: String::new(),
            login_name: "alignak".to_string(),
            login_password: "alignak".to_string(),
            encoding: None,
            verbose: false,
            name: None,
            tags: String::new(),
            tag: String::new(),
            login_method: DEFAULT_LOGIN_METHOD.to_string(),
            discovery_method: DEFAULT_DISCOVERY_METHOD.to_string(),
            timeout_seconds: None,
            methods: HashMap::new(),
        }
    }
}

impl ImportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GLPI_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ImportError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 從主控端傳入的扁平鍵值設定建立
    ///
    /// 方法覆寫使用 `method_<type>` 鍵，例如 `method_host`。
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        let optional = |value: &String| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        for (key, value) in properties {
            match key.as_str() {
                "alias" | "module_alias" => config.alias = value.clone(),
                "uri" => config.uri = value.trim().to_string(),
                "login_name" => config.login_name = value.clone(),
                "login_password" => config.login_password = value.clone(),
                "encoding" => config.encoding = optional(value),
                // 與舊模組相同：任何非空值都代表開啟
                "verbose" => config.verbose = !value.is_empty(),
                "name" => config.name = optional(value),
                "tags" => config.tags = value.clone(),
                "tag" => config.tag = value.clone(),
                "login_method" => config.login_method = value.clone(),
                "discovery_method" => config.discovery_method = value.clone(),
                "timeout_seconds" => {
                    config.timeout_seconds = match optional(value) {
                        Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                            ImportError::InvalidConfigValueError {
                                field: key.clone(),
                                value: raw.clone(),
                                reason: e.to_string(),
                            }
                        })?),
                        None => None,
                    }
                }
                other => {
                    if let Some(type_name) = other.strip_prefix("method_") {
                        config
                            .methods
                            .insert(type_name.to_string(), value.trim().to_string());
                    } else {
                        tracing::debug!("Ignoring unknown module property '{}'", other);
                    }
                }
            }
        }

        Ok(config)
    }

    pub fn is_enabled(&self) -> bool {
        !self.uri.trim().is_empty()
    }

    /// 解析設定的實體標籤：去除空白與重複，舊版 `tag` 不存在時附加在最後
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        let legacy = std::iter::once(self.tag.as_str());

        for raw in self.tags.split(',').chain(legacy) {
            let scope = match raw.trim() {
                "" => continue,
                ALL_ENTITIES_TAG => "",
                scope => scope,
            };
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        scopes
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            login_name: self.login_name.clone(),
            login_password: self.login_password.clone(),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
            encoding: self.encoding.clone().filter(|e| !e.trim().is_empty()),
            discovery_method: self.discovery_method.clone(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        if self.is_enabled() {
            validate_url("uri", self.uri.trim())?;
        }

        validate_non_empty_string("login_method", &self.login_method)?;
        validate_non_empty_string("discovery_method", &self.discovery_method)?;

        if let Some(timeout) = self.timeout_seconds {
            validate_positive_number("timeout_seconds", timeout, 1)?;
        }

        for type_name in self.methods.keys() {
            if find_descriptor(type_name).is_none() {
                return Err(ImportError::ConfigValidationError {
                    field: format!("methods.{}", type_name),
                    message: format!("Unknown object type '{}'", type_name),
                });
            }
        }

        Ok(())
    }
}
