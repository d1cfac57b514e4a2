use super::errors::{from_sdk, malformed};
use super::AwsCloud;
use crate::cloud::{AccountIdentity, ProviderResult};

impl AccountIdentity for AwsCloud {
    fn account_id(&self) -> ProviderResult<String> {
        let output = self
            .block_on(self.sts.get_caller_identity().send())
            .map_err(|error| from_sdk("GetCallerIdentity", error))?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| malformed("GetCallerIdentity", "no account in caller identity"))
    }
}
