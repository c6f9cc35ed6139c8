//! Store and remove provider credentials.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use dialoguer::{Password, theme::ColorfulTheme};
use switchboard_models::ServiceFactory;

#[derive(Args, Debug)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub command: CredentialsCommands,
}

#[derive(Subcommand, Debug)]
pub enum CredentialsCommands {
    /// Store an API key
    Set {
        /// Provider to configure (e.g., groq, openai)
        provider: String,

        /// Scope the key to one model
        #[arg(long)]
        model: Option<String>,

        /// Key value (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,
    },
    /// Delete a stored API key
    Delete {
        provider: String,

        #[arg(long)]
        model: Option<String>,
    },
}

pub async fn run(factory: &ServiceFactory, args: CredentialsArgs) -> Result<()> {
    match args.command {
        CredentialsCommands::Set {
            provider,
            model,
            value,
        } => set(factory, &provider, model.as_deref(), value).await,
        CredentialsCommands::Delete { provider, model } => {
            delete(factory, &provider, model.as_deref()).await
        }
    }
}

async fn set(
    factory: &ServiceFactory,
    provider: &str,
    model: Option<&str>,
    value: Option<String>,
) -> Result<()> {
    let resolver = factory.credentials();
    let key_name = match model {
        Some(m) => resolver.model_key(provider, m),
        None => None,
    }
    .unwrap_or_else(|| resolver.provider_key(provider));

    let secret = match value {
        Some(v) => v,
        None => {
            println!("Enter API key for {provider} (or set {key_name})");
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt("API key")
                .interact()?
        }
    };
    if secret.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    let stored = resolver.store_secret(provider, model, &secret).await?;
    factory.clear_cache(Some(provider));
    println!("Credential saved as {stored}.");
    Ok(())
}

async fn delete(factory: &ServiceFactory, provider: &str, model: Option<&str>) -> Result<()> {
    if factory.credentials().remove_secret(provider, model).await? {
        factory.clear_cache(Some(provider));
        println!("Credential for '{provider}' deleted.");
    } else {
        println!("No stored credential for '{provider}'.");
    }
    Ok(())
}
