use super::errors::{from_sdk, malformed};
use super::AwsCloud;
use crate::cloud::{ProviderResult, TopicControl};

const EMAIL_PROTOCOL: &str = "email";

impl TopicControl for AwsCloud {
    fn create_topic(&self, name: &str) -> ProviderResult<String> {
        let output = self
            .block_on(self.sns.create_topic().name(name).send())
            .map_err(|error| from_sdk("CreateTopic", error))?;
        output
            .topic_arn()
            .map(str::to_string)
            .ok_or_else(|| malformed("CreateTopic", format!("{name} has no ARN")))
    }

    fn subscribe_email(&self, topic_arn: &str, email: &str) -> ProviderResult<()> {
        self.block_on(
            self.sns
                .subscribe()
                .topic_arn(topic_arn)
                .protocol(EMAIL_PROTOCOL)
                .endpoint(email)
                .send(),
        )
        .map_err(|error| from_sdk("Subscribe", error))?;
        Ok(())
    }

    fn list_topic_arns(&self) -> ProviderResult<Vec<String>> {
        let mut arns = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(self.sns.list_topics().set_next_token(token.take()).send())
                .map_err(|error| from_sdk("ListTopics", error))?;
            arns.extend(
                page.topics()
                    .iter()
                    .filter_map(|topic| topic.topic_arn().map(str::to_string)),
            );
            match page.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(arns)
    }

    fn list_subscription_arns(&self, topic_arn: &str) -> ProviderResult<Vec<String>> {
        let mut arns = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.sns
                        .list_subscriptions_by_topic()
                        .topic_arn(topic_arn)
                        .set_next_token(token.take())
                        .send(),
                )
                .map_err(|error| from_sdk("ListSubscriptionsByTopic", error))?;
            arns.extend(
                page.subscriptions()
                    .iter()
                    .filter_map(|subscription| subscription.subscription_arn().map(str::to_string)),
            );
            match page.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(arns)
    }

    fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()> {
        self.block_on(
            self.sns
                .unsubscribe()
                .subscription_arn(subscription_arn)
                .send(),
        )
        .map_err(|error| from_sdk("Unsubscribe", error))?;
        Ok(())
    }

    fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()> {
        self.block_on(self.sns.delete_topic().topic_arn(topic_arn).send())
            .map_err(|error| from_sdk("DeleteTopic", error))?;
        Ok(())
    }
}
