//! TileDB Cloud CLI commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value as Json;

use super::output::Output;
use super::{prompt, UsageError};
use crate::config::CloudConfig;
use crate::engine::{ArrayListing, Backend, CloudClient, Credential, LoginParams, Permission};

#[derive(Subcommand)]
pub enum CloudCommands {
    /// Log in to TileDB Cloud with a token or a username
    Login(LoginArgs),

    /// Print information from TileDB Cloud
    #[command(subcommand)]
    Dump(CloudDumpCommands),

    /// Share an array with a user or organization
    Share {
        /// Array URI (`tiledb://<namespace>/<array>`)
        uri: String,

        /// User or organization to share with
        namespace: String,

        /// Permission to grant (repeatable)
        #[arg(long, short = 'p', value_enum, default_value = "read")]
        permission: Vec<Permission>,
    },

    /// Revoke access to an array
    Unshare {
        /// Array URI (`tiledb://<namespace>/<array>`)
        uri: String,

        /// User or organization to revoke
        namespace: String,
    },
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Token, or username with --username
    #[arg(env = "TILEDB_REST_TOKEN", hide_env_values = true)]
    credential: Option<String>,

    /// Treat the credential as a username and ask for the password
    #[arg(long, short = 'u')]
    username: bool,

    #[arg(long, hide = true)]
    password: Option<String>,

    /// Host to log in to
    #[arg(long)]
    host: Option<String>,

    /// Disable strict SSL verification
    #[arg(long)]
    no_verify_ssl: bool,

    /// Store the username/password instead of creating a session token
    #[arg(long)]
    no_session: bool,

    /// Threads for concurrent requests
    #[arg(long)]
    threads: Option<u32>,
}

/// Keeps only the named properties of each result
#[derive(Args, Debug)]
pub struct PropertyArgs {
    /// Property to print (repeatable; default all)
    #[arg(long = "property", short = 'P')]
    properties: Vec<String>,
}

#[derive(Subcommand)]
pub enum CloudDumpCommands {
    /// Activity log of an array
    Activity {
        /// Array URI
        uri: String,

        #[command(flatten)]
        props: PropertyArgs,
    },

    /// Arrays visible to the logged-in user
    Arrays {
        /// Only arrays in this namespace
        #[arg(long)]
        namespace: Option<String>,

        /// Only arrays matching this search text
        #[arg(long)]
        search: Option<String>,

        /// Page of results to return
        #[arg(long)]
        page: Option<u32>,

        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,

        #[command(flatten)]
        props: PropertyArgs,
    },

    /// Organizations the user belongs to
    Orgs {
        #[command(flatten)]
        props: PropertyArgs,
    },

    /// Profile of the logged-in user
    Profile {
        #[command(flatten)]
        props: PropertyArgs,
    },

    /// A task by id, or the most recent one
    Task {
        /// Task id; the most recent task when omitted
        id: Option<String>,

        #[command(flatten)]
        props: PropertyArgs,
    },
}

pub fn run(
    cmd: CloudCommands,
    client: &dyn Backend,
    config: &CloudConfig,
    output: &Output,
) -> Result<()> {
    match cmd {
        CloudCommands::Login(args) => login(client, config, output, args),
        CloudCommands::Dump(cmd) => dump(client, output, cmd),
        CloudCommands::Share {
            uri,
            namespace,
            permission,
        } => {
            let result = client
                .share_array(&uri, &namespace, &permission)
                .with_context(|| format!("Failed to share {}", uri))?;
            output.outcome(&result, &format!("Shared {} with {}", uri, namespace));
            Ok(())
        }
        CloudCommands::Unshare { uri, namespace } => {
            let result = client
                .unshare_array(&uri, &namespace)
                .with_context(|| format!("Failed to unshare {}", uri))?;
            output.outcome(&result, &format!("Unshared {} from {}", uri, namespace));
            Ok(())
        }
    }
}

fn login(client: &dyn Backend, config: &CloudConfig, output: &Output, args: LoginArgs) -> Result<()> {
    let params = login_params(args, config, || prompt::prompt_password("Password"))?;
    output.verbose_ctx(
        "cloud",
        &format!("Logging in to {}", params.host.as_deref().unwrap_or("the default host")),
    );

    let result = client.login(&params).context("Login failed")?;
    output.outcome(&result, "Logged in to TileDB Cloud");
    Ok(())
}

/// Resolves login arguments against configuration
///
/// `ask_password` is only called for a username without `--password`.
fn login_params(
    args: LoginArgs,
    config: &CloudConfig,
    ask_password: impl FnOnce() -> Result<String>,
) -> Result<LoginParams> {
    let credential = args
        .credential
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            UsageError::new("No credential given and TILEDB_REST_TOKEN is not set")
        })?;

    let credential = if args.username {
        let password = match args.password {
            Some(password) => password,
            None => ask_password()?,
        };
        Credential::Password {
            username: credential,
            password,
        }
    } else {
        Credential::Token(credential)
    };

    Ok(LoginParams {
        credential,
        host: args.host.or_else(|| config.host.clone()),
        verify_ssl: !args.no_verify_ssl,
        no_session: args.no_session,
        threads: args.threads.unwrap_or(config.threads),
    })
}

fn dump(client: &dyn Backend, output: &Output, cmd: CloudDumpCommands) -> Result<()> {
    let (result, props) = match cmd {
        CloudDumpCommands::Activity { uri, props } => (client.array_activity(&uri)?, props),
        CloudDumpCommands::Arrays {
            namespace,
            search,
            page,
            per_page,
            props,
        } => {
            let listing = ArrayListing {
                namespace,
                search,
                page,
                per_page,
            };
            (client.list_arrays(&listing)?, props)
        }
        CloudDumpCommands::Orgs { props } => (client.organizations()?, props),
        CloudDumpCommands::Profile { props } => (client.user_profile()?, props),
        CloudDumpCommands::Task { id, props } => (client.task(id.as_deref())?, props),
    };

    output.value(&select_properties(result, &props.properties));
    Ok(())
}

/// Keeps only `properties` of an object, or of every object in a list
fn select_properties(value: Json, properties: &[String]) -> Json {
    if properties.is_empty() {
        return value;
    }

    match value {
        Json::Object(map) => Json::Object(
            map.into_iter()
                .filter(|(key, _)| properties.contains(key))
                .collect(),
        ),
        Json::Array(items) => Json::Array(
            items
                .into_iter()
                .map(|item| select_properties(item, properties))
                .collect(),
        ),
        other => other,
    }
}
