use tracing::info;

use super::permission::grant_invoke;
use crate::cloud::{
    CorsPolicy, FunctionControl, HttpApi, HttpApiControl, HttpApiSpec, Integration,
    InvokePermission,
};
use crate::error::DeployError;

pub const INVENTORY_ROUTES: [&str; 2] = ["GET /items", "GET /items/{store}"];
pub const DEFAULT_STAGE: &str = "$default";

impl HttpApiSpec {
    /// Public read-only API: any origin, `GET`/`OPTIONS`, any header.
    pub fn public(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cors: CorsPolicy {
                allow_origins: vec!["*".to_string()],
                allow_methods: vec!["GET".to_string(), "OPTIONS".to_string()],
                allow_headers: vec!["*".to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAction {
    Create,
    Reuse(HttpApi),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationAction {
    Create,
    Reuse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    Create,
    EnableAutoDeploy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub api_id: String,
    pub endpoint: String,
    pub routes_created: Vec<String>,
}

pub fn plan_api(current: &[HttpApi], desired: &HttpApiSpec) -> ApiAction {
    current
        .iter()
        .find(|api| api.name == desired.name)
        .cloned()
        .map(ApiAction::Reuse)
        .unwrap_or(ApiAction::Create)
}

pub fn plan_integration(current: &[Integration], function_arn: &str) -> IntegrationAction {
    current
        .iter()
        .find(|integration| integration.uri.as_deref() == Some(function_arn))
        .map(|integration| IntegrationAction::Reuse(integration.id.clone()))
        .unwrap_or(IntegrationAction::Create)
}

/// Route keys from `desired` that are not registered yet, in order.
pub fn plan_routes(existing: &[String], desired: &[&str]) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for key in desired {
        if existing.iter().any(|known| known == key) || missing.iter().any(|known| known == key) {
            continue;
        }
        missing.push(key.to_string());
    }
    missing
}

pub fn plan_stage(exists: bool) -> StageAction {
    if exists {
        StageAction::EnableAutoDeploy
    } else {
        StageAction::Create
    }
}

pub fn api_invoke_permission(
    function_arn: &str,
    region: &str,
    account_id: &str,
    api_id: &str,
) -> InvokePermission {
    InvokePermission {
        function: function_arn.to_string(),
        statement_id: format!("apigw-{api_id}"),
        principal: "apigateway.amazonaws.com".to_string(),
        source_arn: format!("arn:aws:execute-api:{region}:{account_id}:{api_id}/*/*/*"),
    }
}

/// Ensures the HTTP API, its proxy integration, the inventory routes, the
/// auto-deployed default stage and the invoke grant. Returns the API id and
/// endpoint.
pub fn ensure_http_api(
    apis: &impl HttpApiControl,
    functions: &impl FunctionControl,
    spec: &HttpApiSpec,
    function_arn: &str,
    region: &str,
    account_id: &str,
) -> Result<RoutingOutcome, DeployError> {
    let name = spec.name.as_str();
    let existing = apis
        .list_apis()
        .map_err(DeployError::at("list http apis"))?;

    let api = match plan_api(&existing, spec) {
        ApiAction::Reuse(api) => api,
        ApiAction::Create => {
            let api = apis
                .create_api(spec)
                .map_err(DeployError::at(format!("create http api {name}")))?;
            info!(api = %api.id, name, "http api created");
            api
        }
    };
    let api_id = api.id.as_str();

    let integrations = apis
        .list_integrations(api_id)
        .map_err(DeployError::at(format!("list integrations of {name}")))?;
    let integration_id = match plan_integration(&integrations, function_arn) {
        IntegrationAction::Reuse(id) => id,
        IntegrationAction::Create => apis
            .create_proxy_integration(api_id, function_arn)
            .map_err(DeployError::at(format!("create integration on {name}")))?,
    };
    let target = format!("integrations/{integration_id}");

    let route_keys = apis
        .list_route_keys(api_id)
        .map_err(DeployError::at(format!("list routes of {name}")))?;
    let routes_created = plan_routes(&route_keys, &INVENTORY_ROUTES);
    for route_key in &routes_created {
        apis.create_route(api_id, route_key, &target)
            .map_err(DeployError::at(format!("create route {route_key}")))?;
        info!(api = api_id, route = %route_key, "route created");
    }

    let stage_exists = apis
        .stage_exists(api_id, DEFAULT_STAGE)
        .map_err(DeployError::at(format!("look up stage {DEFAULT_STAGE}")))?;
    let staged = match plan_stage(stage_exists) {
        StageAction::EnableAutoDeploy => apis.enable_auto_deploy(api_id, DEFAULT_STAGE),
        StageAction::Create => apis.create_stage(api_id, DEFAULT_STAGE),
    };
    staged.map_err(DeployError::at(format!("ensure stage {DEFAULT_STAGE}")))?;

    grant_invoke(
        functions,
        &api_invoke_permission(function_arn, region, account_id, api_id),
    )?;

    let endpoint = api
        .endpoint
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| DeployError::MissingOutput {
            resource: format!("http api {name}"),
            output: "endpoint",
        })?;

    Ok(RoutingOutcome {
        api_id: api.id,
        endpoint,
        routes_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCloud;

    const FUNCTION_ARN: &str =
        "arn:aws:lambda:us-east-1:123456789012:function:get_inventory_api_dev";

    #[test]
    fn only_missing_routes_are_planned() {
        let existing = vec!["GET /items".to_string(), "POST /items".to_string()];
        assert_eq!(
            plan_routes(&existing, &INVENTORY_ROUTES),
            vec!["GET /items/{store}".to_string()]
        );
        assert!(plan_routes(
            &["GET /items/{store}".to_string(), "GET /items".to_string()],
            &INVENTORY_ROUTES
        )
        .is_empty());
        assert_eq!(
            plan_routes(&[], &["GET /items", "GET /items"]),
            vec!["GET /items".to_string()]
        );
    }

    #[test]
    fn grant_scopes_the_source_to_the_api() {
        let permission = api_invoke_permission(FUNCTION_ARN, "eu-west-1", "123456789012", "a1b2");
        assert_eq!(permission.statement_id, "apigw-a1b2");
        assert_eq!(
            permission.source_arn,
            "arn:aws:execute-api:eu-west-1:123456789012:a1b2/*/*/*"
        );
    }

    #[test]
    fn rerunning_never_duplicates_routes() {
        let cloud = InMemoryCloud::new();
        cloud.seed_function("get_inventory_api_dev");
        let spec = HttpApiSpec::public("inventory-api-dev");

        let first = ensure_http_api(&cloud, &cloud, &spec, FUNCTION_ARN, "us-east-1", "123456789012")
            .expect("first");
        let second =
            ensure_http_api(&cloud, &cloud, &spec, FUNCTION_ARN, "us-east-1", "123456789012")
                .expect("second");

        assert_eq!(first.api_id, second.api_id);
        assert_eq!(first.endpoint, second.endpoint);
        assert_eq!(first.routes_created.len(), 2);
        assert!(second.routes_created.is_empty());

        let mut keys = cloud.route_keys(&first.api_id);
        keys.sort();
        assert_eq!(keys, vec!["GET /items", "GET /items/{store}"]);

        let counts = cloud.counts();
        assert_eq!(counts.apis, 1);
        assert_eq!(counts.integrations, 1);
        assert_eq!(counts.permissions, 1);
        assert_eq!(cloud.stage_auto_deploy(&first.api_id, DEFAULT_STAGE), Some(true));
    }

    #[test]
    fn routes_added_by_hand_are_kept() {
        let cloud = InMemoryCloud::new();
        cloud.seed_function("get_inventory_api_dev");
        let spec = HttpApiSpec::public("inventory-api-dev");
        let outcome =
            ensure_http_api(&cloud, &cloud, &spec, FUNCTION_ARN, "us-east-1", "123456789012")
                .expect("first");

        cloud
            .seed_route(&outcome.api_id, "GET /health")
            .expect("api exists");
        ensure_http_api(&cloud, &cloud, &spec, FUNCTION_ARN, "us-east-1", "123456789012")
            .expect("second");

        assert_eq!(cloud.route_keys(&outcome.api_id).len(), 3);
    }
}
