use crate::cloud::profiles::LATEST_PROFILE;
use crate::cloud::{Cloud, CloudRegistry, ENDPOINT_NAMES, SUFFIX_NAMES};
use crate::config;
use crate::context::Context;
use anyhow::{Context as AnyhowContext, Result};
use std::sync::Arc;
use url::Url;

pub struct CloudCommand;

/// Cloud field values collected from command-line flags
#[derive(Debug, Default)]
pub struct CloudFields {
    pub profile: Option<String>,
    pub endpoints: Vec<(&'static str, String)>,
    pub suffixes: Vec<(&'static str, String)>,
}

impl CloudFields {
    /// Apply the provided values onto a cloud definition. Endpoint values
    /// must be valid URLs.
    fn apply_to(&self, cloud: &mut Cloud) -> Result<()> {
        if let Some(profile) = &self.profile {
            cloud.profile = Some(profile.clone());
        }

        for (name, value) in &self.endpoints {
            Url::parse(value)
                .with_context(|| format!("Invalid URL for endpoint '{}': {}", name, value))?;
            cloud.endpoints.set(name, value);
        }
        for (name, value) in &self.suffixes {
            cloud.suffixes.set(name, value);
        }

        Ok(())
    }
}

impl CloudCommand {
    /// List registered clouds
    pub fn execute_list(ctx: &Context, custom_only: bool) -> Result<()> {
        let registry = Self::registry(ctx)?;

        if custom_only {
            ctx.output.section("Custom Clouds");
            let clouds = registry.custom_clouds()?;
            if clouds.is_empty() {
                ctx.output.dimmed("No custom clouds are registered.");
                return Ok(());
            }
            Self::render_cloud_lines(ctx, &clouds);
        } else {
            ctx.output.section("Clouds");
            Self::render_cloud_lines(ctx, &registry.list_clouds()?);
        }

        Ok(())
    }

    /// Show one cloud in detail; defaults to the active cloud
    pub fn execute_show(ctx: &Context, name: Option<&str>) -> Result<()> {
        let registry = Self::registry(ctx)?;
        let cloud = match name {
            Some(name) => registry.get_cloud(name)?,
            None => registry.get_active_cloud()?,
        };

        ctx.output.section(&cloud.name);
        ctx.output.key_value(
            "Profile",
            cloud.profile.as_deref().unwrap_or(LATEST_PROFILE),
        );
        ctx.output
            .key_value("Active", if cloud.is_active { "yes" } else { "no" });

        ctx.output.subsection("Endpoints");
        for endpoint in ENDPOINT_NAMES {
            ctx.output.key_value(
                endpoint,
                cloud.endpoints.get(endpoint).unwrap_or("(not set)"),
            );
        }

        ctx.output.subsection("Suffixes");
        for suffix in SUFFIX_NAMES {
            ctx.output
                .key_value(suffix, cloud.suffixes.get(suffix).unwrap_or("(not set)"));
        }

        Ok(())
    }

    /// Switch the active cloud
    pub fn execute_set(ctx: &Context, name: &str) -> Result<()> {
        let registry = Self::registry(ctx)?;
        registry.switch_active_cloud(name)?;
        Ok(())
    }

    /// Register a new custom cloud
    pub fn execute_register(ctx: &Context, name: &str, fields: &CloudFields) -> Result<()> {
        let registry = Self::registry(ctx)?;

        let mut cloud = Cloud::new(name);
        fields.apply_to(&mut cloud)?;
        registry.add_cloud(&cloud)?;

        ctx.output
            .success(&format!("Cloud '{}' registered successfully!", name));
        Ok(())
    }

    /// Update a registered cloud, merging flags over the stored definition
    pub fn execute_update(ctx: &Context, name: &str, fields: &CloudFields) -> Result<()> {
        let registry = Self::registry(ctx)?;

        let mut cloud = registry.get_cloud(name)?;
        fields.apply_to(&mut cloud)?;
        registry.update_cloud(&cloud)?;

        ctx.output
            .success(&format!("Cloud '{}' updated successfully!", name));
        Ok(())
    }

    /// Unregister a custom cloud, with a confirmation prompt unless `yes`
    pub fn execute_unregister(ctx: &Context, name: &str, yes: bool) -> Result<()> {
        if !yes {
            let confirmed = ctx
                .input
                .confirm(&format!("Unregister cloud '{}'?", name), false)?;
            if !confirmed {
                ctx.output.dimmed("Cancelled");
                return Ok(());
            }
        }

        let registry = Self::registry(ctx)?;
        registry.remove_cloud(name)?;

        ctx.output
            .success(&format!("Cloud '{}' unregistered successfully!", name));
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

    fn render_cloud_lines(ctx: &Context, clouds: &[Cloud]) {
        for cloud in clouds {
            let profile = cloud.profile.as_deref().unwrap_or(LATEST_PROFILE);
            if cloud.is_active {
                ctx.output
                    .key_value_highlight(&cloud.name, &format!("{} (active)", profile));
            } else {
                ctx.output.key_value(&cloud.name, profile);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::user_input::MockResponse;
    use crate::traits::{MockFileSystem, MockOutput, MockUserInput};

    fn test_context(input: MockUserInput) -> (Arc<MockOutput>, Context) {
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(
            Arc::new(MockFileSystem::new()),
            Arc::new(input),
            output.clone(),
        );
        (output, ctx)
    }

    #[test]
    fn test_register_then_list_shows_custom_cloud() {
        let (output, ctx) = test_context(MockUserInput::new());
        let fields = CloudFields {
            profile: Some("latest".to_string()),
            endpoints: vec![("management", "https://mgmt.contoso.example".to_string())],
            suffixes: Vec::new(),
        };

        CloudCommand::execute_register(&ctx, "contoso", &fields).unwrap();
        assert!(output.has_success());

        CloudCommand::execute_list(&ctx, true).unwrap();
        let rendered = format!("{:?}", output.get_messages());
        assert!(rendered.contains("contoso"));
    }

    #[test]
    fn test_register_rejects_invalid_endpoint_url() {
        let (_output, ctx) = test_context(MockUserInput::new());
        let fields = CloudFields {
            profile: None,
            endpoints: vec![("management", "not a url".to_string())],
            suffixes: Vec::new(),
        };

        assert!(CloudCommand::execute_register(&ctx, "contoso", &fields).is_err());
    }

    #[test]
    fn test_unregister_cancelled_keeps_cloud() {
        let input = MockUserInput::with_responses(vec![MockResponse::Confirm(false)]);
        let (output, ctx) = test_context(input);
        let fields = CloudFields {
            endpoints: vec![("management", "https://mgmt.contoso.example".to_string())],
            ..Default::default()
        };
        CloudCommand::execute_register(&ctx, "contoso", &fields).unwrap();

        CloudCommand::execute_unregister(&ctx, "contoso", false).unwrap();

        assert!(output.contains_message(&crate::traits::output::OutputMessage::Dimmed(
            "Cancelled".to_string()
        )));
        // Still listed afterwards
        output.clear();
        CloudCommand::execute_list(&ctx, true).unwrap();
        assert!(format!("{:?}", output.get_messages()).contains("contoso"));
    }

    #[test]
    fn test_unregister_with_yes_skips_prompt() {
        let (output, ctx) = test_context(MockUserInput::new());
        let fields = CloudFields {
            endpoints: vec![("management", "https://mgmt.contoso.example".to_string())],
            ..Default::default()
        };
        CloudCommand::execute_register(&ctx, "contoso", &fields).unwrap();

        CloudCommand::execute_unregister(&ctx, "contoso", true).unwrap();

        output.clear();
        CloudCommand::execute_list(&ctx, true).unwrap();
        assert!(!format!("{:?}", output.get_messages()).contains("contoso"));
    }
}
