mod account;
mod cloud;
mod commands;
mod config;
mod context;
mod output;
mod traits;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{AccountCommand, CloudCommand, CloudFields};
use context::Context;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Stratus CLI - manage Stratus cloud deployments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the registered Stratus clouds
    Cloud {
        #[command(subcommand)]
        command: CloudCommands,
    },

    /// Manage subscriptions for the active cloud
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Subcommand)]
enum CloudCommands {
    /// List registered clouds
    List {
        /// Show only custom clouds
        #[arg(long)]
        custom: bool,
    },

    /// Show details of a cloud (defaults to the active cloud)
    Show {
        /// Cloud name
        name: Option<String>,
    },

    /// Switch the active cloud
    Set {
        /// Cloud name
        #[arg(short, long)]
        name: String,
    },

    /// Register a custom cloud
    Register {
        /// Cloud name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        fields: CloudFieldArgs,
    },

    /// Update a registered cloud
    Update {
        /// Cloud name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        fields: CloudFieldArgs,
    },

    /// Unregister a custom cloud
    Unregister {
        /// Cloud name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// List cached subscriptions
    List,

    /// Show the active cloud and default subscription
    Show,

    /// Set the default subscription for the active cloud
    Set {
        /// Subscription id
        #[arg(short, long)]
        subscription: String,
    },
}

/// Cloud field flags shared by `cloud register` and `cloud update`
#[derive(Args)]
struct CloudFieldArgs {
    /// API profile used by the cloud
    #[arg(long)]
    profile: Option<String>,

    /// Management endpoint URL
    #[arg(long)]
    endpoint_management: Option<String>,

    /// Resource manager endpoint URL
    #[arg(long)]
    endpoint_resource_manager: Option<String>,

    /// Portal endpoint URL
    #[arg(long)]
    endpoint_portal: Option<String>,

    /// Authentication endpoint URL
    #[arg(long)]
    endpoint_authentication: Option<String>,

    /// SQL management endpoint URL
    #[arg(long)]
    endpoint_sql_management: Option<String>,

    /// Gallery endpoint URL
    #[arg(long)]
    endpoint_gallery: Option<String>,

    /// Batch endpoint URL
    #[arg(long)]
    endpoint_batch: Option<String>,

    /// Storage endpoint suffix
    #[arg(long)]
    suffix_storage_endpoint: Option<String>,

    /// SQL server hostname suffix
    #[arg(long)]
    suffix_sql_server_hostname: Option<String>,

    /// Vault DNS suffix
    #[arg(long)]
    suffix_vault_dns: Option<String>,
}

impl CloudFieldArgs {
    fn into_fields(self) -> CloudFields {
        let mut fields = CloudFields {
            profile: self.profile,
            ..Default::default()
        };

        let endpoints = [
            ("management", self.endpoint_management),
            ("resource_manager", self.endpoint_resource_manager),
            ("portal", self.endpoint_portal),
            ("authentication", self.endpoint_authentication),
            ("sql_management", self.endpoint_sql_management),
            ("gallery", self.endpoint_gallery),
            ("batch", self.endpoint_batch),
        ];
        for (name, value) in endpoints {
            if let Some(value) = value {
                fields.endpoints.push((name, value));
            }
        }

        let suffixes = [
            ("storage_endpoint", self.suffix_storage_endpoint),
            ("sql_server_hostname", self.suffix_sql_server_hostname),
            ("vault_dns", self.suffix_vault_dns),
        ];
        for (name, value) in suffixes {
            if let Some(value) = value {
                fields.suffixes.push((name, value));
            }
        }

        fields
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::new();

    match cli.command {
        Commands::Cloud { command } => match command {
            CloudCommands::List { custom } => {
                CloudCommand::execute_list(&ctx, custom)?;
            }
            CloudCommands::Show { name } => {
                CloudCommand::execute_show(&ctx, name.as_deref())?;
            }
            CloudCommands::Set { name } => {
                CloudCommand::execute_set(&ctx, &name)?;
            }
            CloudCommands::Register { name, fields } => {
                CloudCommand::execute_register(&ctx, &name, &fields.into_fields())?;
            }
            CloudCommands::Update { name, fields } => {
                CloudCommand::execute_update(&ctx, &name, &fields.into_fields())?;
            }
            CloudCommands::Unregister { name, yes } => {
                CloudCommand::execute_unregister(&ctx, &name, yes)?;
            }
        },
        Commands::Account { command } => match command {
            AccountCommands::List => {
                AccountCommand::execute_list(&ctx)?;
            }
            AccountCommands::Show => {
                AccountCommand::execute_show(&ctx)?;
            }
            AccountCommands::Set { subscription } => {
                AccountCommand::execute_set(&ctx, &subscription)?;
            }
        },
    }

    Ok(())
}
