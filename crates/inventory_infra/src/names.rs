//! Resource names derived from the deployment suffix.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionRole {
    Loader,
    QueryApi,
    Notifier,
}

impl FunctionRole {
    pub const ALL: [FunctionRole; 3] = [
        FunctionRole::Loader,
        FunctionRole::QueryApi,
        FunctionRole::Notifier,
    ];

    /// Binary name in `inventory_lambda`, also the artifact directory name.
    pub fn base_name(self) -> &'static str {
        match self {
            FunctionRole::Loader => "load_inventory",
            FunctionRole::QueryApi => "get_inventory_api",
            FunctionRole::Notifier => "notify_low_stock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub suffix: String,
    pub uploads_bucket: String,
    pub web_bucket: String,
    pub table: String,
    pub topic: String,
    pub api: String,
    loader: String,
    query_api: String,
    notifier: String,
}

impl ResourceNames {
    pub fn new(suffix: &str, table: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            uploads_bucket: format!("inventory-uploads-{suffix}"),
            web_bucket: format!("inventory-web-{suffix}"),
            table: table.to_string(),
            topic: format!("inventory-low-stock-{suffix}"),
            api: format!("inventory-api-{suffix}"),
            loader: format!("{}_{suffix}", FunctionRole::Loader.base_name()),
            query_api: format!("{}_{suffix}", FunctionRole::QueryApi.base_name()),
            notifier: format!("{}_{suffix}", FunctionRole::Notifier.base_name()),
        }
    }

    pub fn function(&self, role: FunctionRole) -> &str {
        match role {
            FunctionRole::Loader => &self.loader,
            FunctionRole::QueryApi => &self.query_api,
            FunctionRole::Notifier => &self.notifier,
        }
    }

    pub fn buckets(&self) -> [&str; 2] {
        [&self.uploads_bucket, &self.web_bucket]
    }
}
