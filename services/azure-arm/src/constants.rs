// Headers used by Azure Resource Manager.
pub const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
pub const RETRY_AFTER: &str = "retry-after";

// Query keys.
pub const API_VERSION: &str = "api-version";
pub const SKIP_TOKEN_KEYS: [&str; 2] = ["$skipToken", "$skiptoken"];

// Environment values.
pub const AZURE_ENVIRONMENT: &str = "AZURE_ENVIRONMENT";
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const AZURE_READ_ONLY: &str = "AZURE_READ_ONLY";
pub const AZURE_DEBUG: &str = "AZURE_DEBUG";

// Fixed api versions.
pub const TOKEN_API_VERSION: &str = "1.0";
pub const AAD_GRAPH_API_VERSION: &str = "1.6";
pub const LOG_ANALYTICS_API_VERSION: &str = "2021-12-01-preview";
pub const TAGS_API_VERSION: &str = "2021-04-01";
pub const MICROSOFT_GRAPH_VERSION: &str = "v1.0";

// Azure error codes with special handling.
pub const SUBSCRIPTION_NOT_REGISTERED: &str = "SubscriptionNotRegistered";
pub const MISSING_SUBSCRIPTION_REGISTRATION: &str = "MissingSubscriptionRegistration";
pub const OS_PROVISIONING_CODES: [&str; 3] = [
    "OSProvisioningTimedOut",
    "OSProvisioningClientError",
    "OSProvisioningInternalError",
];

/// Provider namespaces that get registered on demand.
pub const REGISTRABLE_NAMESPACES: [&str; 9] = [
    "Microsoft.Compute",
    "Microsoft.ClassicCompute",
    "Microsoft.Network",
    "Microsoft.ClassicNetwork",
    "Microsoft.Storage",
    "Microsoft.ClassicStorage",
    "Microsoft.Billing",
    "Microsoft.Insights",
    "Microsoft.Authorization",
];

/// Tag key prefixes reserved by Azure.
pub const RESERVED_TAG_PREFIXES: [&str; 3] = ["microsoft", "azure", "windows"];
