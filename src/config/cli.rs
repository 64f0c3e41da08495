use crate::config::import_config::ImportConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "glpi-import")]
#[command(about = "Import monitoring configuration from a GLPI web service")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// GLPI web service URI (overrides the file)
    #[arg(long)]
    pub uri: Option<String>,

    #[arg(long)]
    pub login_name: Option<String>,

    #[arg(long)]
    pub login_password: Option<String>,

    /// Comma-separated entity tags, empty to discover them
    #[arg(long)]
    pub tags: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub encoding: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Print the result on a single line")]
    pub compact: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn load(&self) -> Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::from_file(path)?,
            None => ImportConfig::default(),
        };

        if let Some(uri) = &self.uri {
            config.uri = uri.clone();
        }
        if let Some(login_name) = &self.login_name {
            config.login_name = login_name.clone();
        }
        if let Some(login_password) = &self.login_password {
            config.login_password = login_password.clone();
        }
        if let Some(tags) = &self.tags {
            config.tags = tags.clone();
        }
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = Some(encoding.clone());
        }
        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
