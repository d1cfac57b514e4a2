//! AWS SDK bindings for the provider seams in [`crate::cloud`].
//!
//! [`AwsCloud`] owns a current-thread runtime and blocks on every SDK call,
//! so the workflows stay synchronous and strictly sequential.

use std::future::Future;

use aws_config::{BehaviorVersion, Region};
use tokio::runtime::{Builder, Runtime};

mod apigateway;
mod dynamodb;
pub mod errors;
mod lambda;
mod s3;
mod sns;
mod sts;

pub struct AwsCloud {
    runtime: Runtime,
    s3: aws_sdk_s3::Client,
    dynamodb: aws_sdk_dynamodb::Client,
    lambda: aws_sdk_lambda::Client,
    sns: aws_sdk_sns::Client,
    apigateway: aws_sdk_apigatewayv2::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsCloud {
    /// Loads credentials from the default chain and pins every client to `region`.
    pub fn connect(region: &str) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );

        Ok(Self {
            s3: aws_sdk_s3::Client::new(&sdk_config),
            dynamodb: aws_sdk_dynamodb::Client::new(&sdk_config),
            lambda: aws_sdk_lambda::Client::new(&sdk_config),
            sns: aws_sdk_sns::Client::new(&sdk_config),
            apigateway: aws_sdk_apigatewayv2::Client::new(&sdk_config),
            sts: aws_sdk_sts::Client::new(&sdk_config),
            runtime,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
