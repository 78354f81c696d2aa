// --- File: crates/calgraph_config/src/models.rs ---
use serde::{Deserialize, Serialize};

// Keys are matched after normalisation (lowercase, no underscores), see
// `normalize_keys` in lib.rs. That is why the renames below look flattened.

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCHEDULE_TIME_ZONE: &str = "Pacific Standard Time";
pub const DEFAULT_AVAILABILITY_INTERVAL: u32 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// --- Azure app registration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AzureConfig {
    #[serde(rename = "clientid")]
    pub client_id: String, // Mandatory
    #[serde(rename = "tenantid")]
    pub tenant_id: String, // Mandatory
    #[serde(rename = "graphuserscopes")]
    pub graph_user_scopes: String, // Space separated, e.g. "User.Read Calendars.ReadWrite"
}

impl AzureConfig {
    /// Splits the space separated scope list.
    pub fn scopes(&self) -> Vec<String> {
        self.graph_user_scopes
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// How touching intervals are treated by the availability check.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Closed intervals: an event ending exactly when the candidate starts conflicts.
    #[default]
    Inclusive,
    /// `[start, end)` intervals: back-to-back events do not conflict.
    #[serde(alias = "halfopen")]
    HalfOpen,
}

// --- Graph client settings ---
// All optional in the config file.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    #[serde(rename = "baseurl")]
    pub base_url: String,
    pub authority: String,
    /// Windows zone name sent to Graph in dateTimeTimeZone values and the Prefer header.
    #[serde(rename = "timezone")]
    pub time_zone: String,
    /// IANA zone used to compute the preview window. `None` means the system zone.
    #[serde(rename = "localtimezone")]
    pub local_time_zone: Option<String>,
    /// getSchedule granularity in minutes.
    #[serde(rename = "availabilityinterval")]
    pub availability_interval: u32,
    #[serde(rename = "boundarypolicy")]
    pub boundary_policy: BoundaryPolicy,
    #[serde(rename = "timeoutsecs")]
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            time_zone: DEFAULT_SCHEDULE_TIME_ZONE.to_string(),
            local_time_zone: None,
            availability_interval: DEFAULT_AVAILABILITY_INTERVAL,
            boundary_policy: BoundaryPolicy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Azure section is mandatory
    pub azure: AzureConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}
