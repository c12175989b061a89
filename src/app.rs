//! Application entry: wires settings, authorization, the Gmail store and the
//! harvest pipeline together.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, Authorizer, ClientSecret, TokenCache};
use crate::config::{ConfigError, Settings};
use crate::providers::email::{GmailStore, MessageStore, StoreError};
use crate::services::{write_contacts, Harvest, HarvestService};

/// Errors that end a run with a non-zero exit status.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid configuration, detected before any network activity.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No access token could be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The message listing failed; partial results were already written.
    #[error("harvest aborted: {0}")]
    Transport(#[from] StoreError),

    /// Results could not be written.
    #[error("unable to write results: {0}")]
    Output(#[from] std::io::Error),
}

/// Runs a harvest against Gmail and writes the contacts to stdout.
pub async fn run(settings: Settings) -> Result<(), HarvestError> {
    let filter = settings.filter()?;
    let cache = TokenCache::new(settings.token_cache_path()?);

    let secret = ClientSecret::load(&settings.auth.client_secret_path).await?;
    let authorizer = Arc::new(Authorizer::new(&secret, cache)?);
    authorizer.authorize().await?;

    let service = HarvestService::new(GmailStore::new(authorizer), filter);
    let mut stdout = std::io::stdout();
    harvest_to(&service, &settings, &mut stdout).await
}

/// Runs a harvest against any store and writes the contacts to `out`.
///
/// Contacts gathered before a listing failure are written before the
/// failure is returned.
pub async fn harvest_to<S, W>(
    service: &HarvestService<S>,
    settings: &Settings,
    out: &mut W,
) -> Result<(), HarvestError>
where
    S: MessageStore,
    W: Write,
{
    let Harvest {
        contacts,
        stats,
        error,
    } = service.harvest(settings.query(), settings.limit()).await;

    write_contacts(out, &contacts, settings.output)?;
    tracing::info!(
        pages = stats.pages_listed,
        messages = stats.messages_processed,
        fetch_failures = stats.fetch_failures,
        seen = stats.addresses_seen,
        rejected = stats.addresses_rejected,
        contacts = contacts.len(),
        "Wrote contacts"
    );

    match error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
