use std::fmt::{Display, Formatter};
use std::str::FromStr;

use azrest_core::Error;

/// The Azure cloud a client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AzureEnvironment {
    /// Azure public cloud.
    #[default]
    Public,
    /// Azure operated by 21Vianet.
    China,
    /// Azure Germany.
    Germany,
    /// Azure US Government.
    USGovernment,
}

impl AzureEnvironment {
    /// Endpoints served by this cloud.
    pub fn endpoints(&self) -> Endpoints {
        match self {
            AzureEnvironment::Public => Endpoints {
                resource_manager: "https://management.azure.com/".to_string(),
                active_directory: "https://login.microsoftonline.com/".to_string(),
                graph: "https://graph.windows.net/".to_string(),
                microsoft_graph: "https://graph.microsoft.com/".to_string(),
                microsoft_graph_login: "https://login.microsoftonline.com/".to_string(),
                log_analytics: Some("https://api.loganalytics.io".to_string()),
                storage_suffix: "core.windows.net".to_string(),
            },
            AzureEnvironment::China => Endpoints {
                resource_manager: "https://management.chinacloudapi.cn/".to_string(),
                active_directory: "https://login.chinacloudapi.cn/".to_string(),
                graph: "https://graph.chinacloudapi.cn/".to_string(),
                microsoft_graph: "https://microsoftgraph.chinacloudapi.cn/".to_string(),
                microsoft_graph_login: "https://login.partner.microsoftonline.cn/".to_string(),
                log_analytics: Some("https://api.loganalytics.azure.cn".to_string()),
                storage_suffix: "core.chinacloudapi.cn".to_string(),
            },
            AzureEnvironment::Germany => Endpoints {
                resource_manager: "https://management.microsoftazure.de/".to_string(),
                active_directory: "https://login.microsoftonline.de/".to_string(),
                graph: "https://graph.cloudapi.de/".to_string(),
                microsoft_graph: "https://graph.microsoft.de/".to_string(),
                microsoft_graph_login: "https://login.microsoftonline.de/".to_string(),
                log_analytics: None,
                storage_suffix: "core.cloudapi.de".to_string(),
            },
            AzureEnvironment::USGovernment => Endpoints {
                resource_manager: "https://management.usgovcloudapi.net/".to_string(),
                active_directory: "https://login.microsoftonline.us/".to_string(),
                graph: "https://graph.windows.net/".to_string(),
                microsoft_graph: "https://graph.microsoft.us/".to_string(),
                microsoft_graph_login: "https://login.microsoftonline.us/".to_string(),
                log_analytics: Some("https://api.loganalytics.us".to_string()),
                storage_suffix: "core.usgovcloudapi.net".to_string(),
            },
        }
    }
}

impl FromStr for AzureEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azurepubliccloud" | "public" => Ok(AzureEnvironment::Public),
            "azurechinacloud" | "china" => Ok(AzureEnvironment::China),
            "azuregermancloud" | "germany" => Ok(AzureEnvironment::Germany),
            "azureusgovernmentcloud" | "usgovernment" => Ok(AzureEnvironment::USGovernment),
            _ => Err(Error::config_invalid(format!(
                "unknown azure environment: {s}"
            ))),
        }
    }
}

impl Display for AzureEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AzureEnvironment::Public => write!(f, "AzurePublicCloud"),
            AzureEnvironment::China => write!(f, "AzureChinaCloud"),
            AzureEnvironment::Germany => write!(f, "AzureGermanCloud"),
            AzureEnvironment::USGovernment => write!(f, "AzureUSGovernmentCloud"),
        }
    }
}

/// Endpoints of one Azure cloud.
///
/// ARM and Graph roots keep their trailing slash since they double as token audiences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Azure Resource Manager root, also the ARM token audience.
    pub resource_manager: String,
    /// AAD login host used by the v1 token endpoint.
    pub active_directory: String,
    /// Legacy AAD Graph root.
    pub graph: String,
    /// Microsoft Graph root.
    pub microsoft_graph: String,
    /// Login host issuing Microsoft Graph tokens.
    pub microsoft_graph_login: String,
    /// Log Analytics root, `None` when the cloud offers none.
    pub log_analytics: Option<String>,
    /// Domain suffix of storage endpoints, e.g. `core.windows.net`.
    pub storage_suffix: String,
}

impl Endpoints {
    /// Point every endpoint below the same base url.
    ///
    /// ARM and the login hosts live at the root, the other services under their
    /// own prefix (`aadgraph/`, `msgraph/`, `loganalytics`) so that their token
    /// audiences stay distinct. Mostly useful for running against a local mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            resource_manager: format!("{base}/"),
            active_directory: format!("{base}/"),
            graph: format!("{base}/aadgraph/"),
            microsoft_graph: format!("{base}/msgraph/"),
            microsoft_graph_login: format!("{base}/"),
            log_analytics: Some(format!("{base}/loganalytics")),
            storage_suffix: AzureEnvironment::Public.endpoints().storage_suffix,
        }
    }

    /// Blob service endpoint of a storage account.
    pub fn blob_endpoint(&self, account: &str) -> String {
        format!("https://{account}.blob.{}", self.storage_suffix)
    }
}
