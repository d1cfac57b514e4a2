use aws_sdk_apigatewayv2::types::{Cors, IntegrationType, ProtocolType};

use super::errors::{from_sdk, malformed, OptionalText};
use super::AwsCloud;
use crate::cloud::{HttpApi, HttpApiControl, HttpApiSpec, Integration, ProviderResult};

const PAYLOAD_FORMAT_VERSION: &str = "2.0";

impl HttpApiControl for AwsCloud {
    fn list_apis(&self) -> ProviderResult<Vec<HttpApi>> {
        let mut apis = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(self.apigateway.get_apis().set_next_token(token.take()).send())
                .map_err(|error| from_sdk("GetApis", error))?;
            for api in page.items() {
                let (Some(id), Some(name)) = (api.api_id().text(), api.name().text()) else {
                    continue;
                };
                apis.push(HttpApi {
                    id,
                    name,
                    endpoint: api.api_endpoint().text(),
                });
            }
            match page.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(apis)
    }

    fn create_api(&self, spec: &HttpApiSpec) -> ProviderResult<HttpApi> {
        let cors = Cors::builder()
            .set_allow_origins(Some(spec.cors.allow_origins.clone()))
            .set_allow_methods(Some(spec.cors.allow_methods.clone()))
            .set_allow_headers(Some(spec.cors.allow_headers.clone()))
            .build();
        let output = self
            .block_on(
                self.apigateway
                    .create_api()
                    .name(&spec.name)
                    .protocol_type(ProtocolType::Http)
                    .cors_configuration(cors)
                    .send(),
            )
            .map_err(|error| from_sdk("CreateApi", error))?;

        let id = output
            .api_id()
            .text()
            .ok_or_else(|| malformed("CreateApi", format!("{} has no id", spec.name)))?;
        Ok(HttpApi {
            id,
            name: spec.name.clone(),
            endpoint: output.api_endpoint().text(),
        })
    }

    fn list_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>> {
        let mut integrations = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.apigateway
                        .get_integrations()
                        .api_id(api_id)
                        .set_next_token(token.take())
                        .send(),
                )
                .map_err(|error| from_sdk("GetIntegrations", error))?;
            integrations.extend(page.items().iter().filter_map(|integration| {
                integration.integration_id().text().map(|id| Integration {
                    id,
                    uri: integration.integration_uri().text(),
                })
            }));
            match page.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(integrations)
    }

    fn create_proxy_integration(&self, api_id: &str, function_arn: &str) -> ProviderResult<String> {
        let output = self
            .block_on(
                self.apigateway
                    .create_integration()
                    .api_id(api_id)
                    .integration_type(IntegrationType::AwsProxy)
                    .integration_uri(function_arn)
                    .payload_format_version(PAYLOAD_FORMAT_VERSION)
                    .send(),
            )
            .map_err(|error| from_sdk("CreateIntegration", error))?;
        output
            .integration_id()
            .text()
            .ok_or_else(|| malformed("CreateIntegration", "no integration id returned"))
    }

    fn list_route_keys(&self, api_id: &str) -> ProviderResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.apigateway
                        .get_routes()
                        .api_id(api_id)
                        .set_next_token(token.take())
                        .send(),
                )
                .map_err(|error| from_sdk("GetRoutes", error))?;
            keys.extend(page.items().iter().filter_map(|route| route.route_key().text()));
            match page.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(keys)
    }

    fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<()> {
        self.block_on(
            self.apigateway
                .create_route()
                .api_id(api_id)
                .route_key(route_key)
                .target(target)
                .send(),
        )
        .map_err(|error| from_sdk("CreateRoute", error))?;
        Ok(())
    }

    fn stage_exists(&self, api_id: &str, stage: &str) -> ProviderResult<bool> {
        match self.block_on(
            self.apigateway
                .get_stage()
                .api_id(api_id)
                .stage_name(stage)
                .send(),
        ) {
            Ok(_) => Ok(true),
            Err(error) => {
                let error = from_sdk("GetStage", error);
                if error.is_not_found() {
                    Ok(false)
                } else {
                    Err(error)
                }
            }
        }
    }

    fn create_stage(&self, api_id: &str, stage: &str) -> ProviderResult<()> {
        self.block_on(
            self.apigateway
                .create_stage()
                .api_id(api_id)
                .stage_name(stage)
                .auto_deploy(true)
                .send(),
        )
        .map_err(|error| from_sdk("CreateStage", error))?;
        Ok(())
    }

    fn enable_auto_deploy(&self, api_id: &str, stage: &str) -> ProviderResult<()> {
        self.block_on(
            self.apigateway
                .update_stage()
                .api_id(api_id)
                .stage_name(stage)
                .auto_deploy(true)
                .send(),
        )
        .map_err(|error| from_sdk("UpdateStage", error))?;
        Ok(())
    }

    fn delete_api(&self, api_id: &str) -> ProviderResult<()> {
        self.block_on(self.apigateway.delete_api().api_id(api_id).send())
            .map_err(|error| from_sdk("DeleteApi", error))?;
        Ok(())
    }
}
