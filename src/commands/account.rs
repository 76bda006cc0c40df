use crate::account::SubscriptionCache;
use crate::cloud::CloudRegistry;
use crate::config;
use crate::context::Context;
use anyhow::{Context as AnyhowContext, Result};
use std::sync::Arc;
use uuid::Uuid;

pub struct AccountCommand;

impl AccountCommand {
    /// List cached subscriptions
    pub fn execute_list(ctx: &Context) -> Result<()> {
        let cache = Self::cache(ctx)?;
        let subscriptions = cache.load()?;

        ctx.output.section("Subscriptions");
        if subscriptions.is_empty() {
            ctx.output
                .dimmed("No subscriptions found. Use 'stratus login' to log in.");
            return Ok(());
        }

        for subscription in subscriptions {
            let marker = if subscription.is_default {
                " (default)"
            } else {
                ""
            };
            ctx.output.key_value(
                &subscription.name,
                &format!(
                    "{} [{}]{}",
                    subscription.id, subscription.state, marker
                ),
            );
        }

        Ok(())
    }

    /// Show the active cloud and the default subscription
    pub fn execute_show(ctx: &Context) -> Result<()> {
        let registry = Self::registry(ctx)?;
        let cache = Self::cache(ctx)?;

        let cloud = registry.get_active_cloud()?;

        ctx.output.section("Account");
        ctx.output.key_value_highlight("Cloud", &cloud.name);

        match cache.get_active()? {
            Some(subscription) => {
                ctx.output.key_value(
                    "Subscription",
                    &format!("{} ({})", subscription.name, subscription.id),
                );
            }
            None => ctx.output.dimmed("No default subscription set."),
        }

        Ok(())
    }

    /// Make a cached subscription the default and associate it with the
    /// active cloud
    pub fn execute_set(ctx: &Context, subscription_id: &str) -> Result<()> {
        Uuid::parse_str(subscription_id).with_context(|| {
            format!(
                "The subscription id '{}' is not a valid UUID.",
                subscription_id
            )
        })?;

        let cache = Self::cache(ctx)?;
        let subscription = cache.set_active(subscription_id)?;

        let registry = Self::registry(ctx)?;
        let active_cloud = registry.get_active_cloud_name()?;
        registry.set_cloud_subscription(&active_cloud, Some(subscription_id))?;

        ctx.output.success(&format!(
            "Active subscription set to '{} ({})'.",
            subscription.name, subscription.id
        ));
        Ok(())
    }

    fn registry(ctx: &Context) -> Result<CloudRegistry> {
        let config_dir = config::global_config_dir()?;
        Ok(CloudRegistry::new(
            Arc::clone(&ctx.fs),
            Arc::clone(&ctx.output),
            config_dir,
        ))
    }

    fn cache(ctx: &Context) -> Result<SubscriptionCache> {
        let config_dir = config::global_config_dir()?;
        Ok(SubscriptionCache::new(Arc::clone(&ctx.fs), config_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Subscription, ENABLED_STATE};
    use crate::traits::{MockFileSystem, MockOutput, MockUserInput};

    const SUB_ID: &str = "b5e0e2c7-22aa-4b4a-8f7e-3e5b7a4c2d10";

    fn test_context_with_subscription() -> (Arc<MockOutput>, Context) {
        let fs = Arc::new(MockFileSystem::new());
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(fs, Arc::new(MockUserInput::new()), output.clone());

        let cache = AccountCommand::cache(&ctx).unwrap();
        cache
            .save(&[Subscription {
                id: SUB_ID.to_string(),
                name: "Dev".to_string(),
                state: ENABLED_STATE.to_string(),
                cloud_name: "StratusCloud".to_string(),
                is_default: false,
            }])
            .unwrap();

        (output, ctx)
    }

    #[test]
    fn test_set_marks_default_and_associates_with_active_cloud() {
        let (output, ctx) = test_context_with_subscription();

        AccountCommand::execute_set(&ctx, SUB_ID).unwrap();

        assert!(output.has_success());
        let registry = AccountCommand::registry(&ctx).unwrap();
        assert_eq!(
            registry
                .get_cloud_subscription("StratusCloud")
                .unwrap()
                .as_deref(),
            Some(SUB_ID)
        );
    }

    #[test]
    fn test_set_rejects_non_uuid_id() {
        let (_output, ctx) = test_context_with_subscription();
        assert!(AccountCommand::execute_set(&ctx, "not-a-uuid").is_err());
    }

    #[test]
    fn test_list_renders_subscriptions() {
        let (output, ctx) = test_context_with_subscription();

        AccountCommand::execute_list(&ctx).unwrap();

        let rendered = format!("{:?}", output.get_messages());
        assert!(rendered.contains("Dev"));
        assert!(rendered.contains(SUB_ID));
    }

    #[test]
    fn test_show_without_default_subscription() {
        let (output, ctx) = test_context_with_subscription();

        AccountCommand::execute_show(&ctx).unwrap();

        let rendered = format!("{:?}", output.get_messages());
        assert!(rendered.contains("StratusCloud"));
        assert!(rendered.contains("No default subscription set."));
    }
}
