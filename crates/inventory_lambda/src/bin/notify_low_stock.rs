use std::sync::Arc;

use inventory_core::contract::AlertSummary;
use inventory_lambda::adapters::alert_publisher::AlertPublisher;
use inventory_lambda::config::NotifierConfig;
use inventory_lambda::handlers::notify::handle_change_stream;
use inventory_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct SnsAlertPublisher {
    sns_client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl AlertPublisher for SnsAlertPublisher {
    fn publish(&self, subject: &str, message: &str) -> Result<(), String> {
        let client = self.sns_client.clone();
        let topic_arn = self.topic_arn.clone();
        let subject = subject.to_string();
        let message = message.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .subject(subject)
                    .message(message)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to publish to sns: {}",
                            aws_sdk_sns::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct Dependencies {
    config: NotifierConfig,
    publisher: SnsAlertPublisher,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: Arc<Dependencies>,
) -> Result<AlertSummary, Error> {
    handle_change_stream(event.payload, &deps.config, &deps.publisher).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = NotifierConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let publisher = SnsAlertPublisher {
        sns_client: aws_sdk_sns::Client::new(&aws_config),
        topic_arn: config.topic_arn.clone(),
    };
    let deps = Arc::new(Dependencies { config, publisher });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let deps = deps.clone();
        async move { handle_request(event, deps).await }
    }))
    .await
}
