use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    selectors, Account, AccountsSnapshot, SessionState, SessionStore,
};
use serde::Serialize;
use shared::{domain::Identity, protocol::decode_action_log};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    actions: PathBuf,
    #[arg(long = "account", value_parser = parse_account)]
    accounts: Vec<Account>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    trace_states: bool,
}

#[derive(Serialize)]
struct AccountReport<'a> {
    account: String,
    active: bool,
    event_queue_id: Option<&'a str>,
    push_token_requests_in_progress: i32,
}

#[derive(Serialize)]
struct Report<'a> {
    actions_applied: usize,
    state: &'a SessionState,
    accounts: Vec<AccountReport<'a>>,
}

fn parse_account(raw: &str) -> Result<Account, String> {
    let (realm, email) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected REALM_URL=EMAIL, got '{raw}'"))?;
    let realm = Url::parse(realm).map_err(|err| format!("invalid realm '{realm}': {err}"))?;
    if email.trim().is_empty() {
        return Err("email must not be empty".to_string());
    }
    Ok(Account::new(Identity::new(realm, email.trim()), "replay"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings_from(&args.config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw = tokio::fs::read_to_string(&args.actions)
        .await
        .with_context(|| format!("failed to read action log '{}'", args.actions.display()))?;
    let actions = decode_action_log(&raw)?;
    tracing::info!(count = actions.len(), "replaying session actions");

    let accounts = AccountsSnapshot::new(args.accounts);
    let (_accounts_tx, accounts_rx) = watch::channel(accounts.clone());
    let (session, _store_task) = SessionStore::spawn(&settings, accounts_rx);

    let mut state = session.state();
    for action in &actions {
        state = session.dispatch_and_wait(action.clone()).await?;
        if args.trace_states {
            println!(
                "{} -> {}",
                action.kind(),
                serde_json::to_string(&state).context("failed to encode state")?
            );
        }
    }

    let account_reports = accounts
        .accounts
        .iter()
        .map(|account| AccountReport {
            account: account.identity.to_string(),
            active: accounts.active_identity() == Some(&account.identity),
            event_queue_id: selectors::active_event_queue_id(&state, &accounts, &account.identity),
            push_token_requests_in_progress: selectors::push_token_registration_count(
                &state,
                &accounts,
                &account.identity,
            ),
        })
        .collect();

    let report = Report {
        actions_applied: actions.len(),
        state: &state,
        accounts: account_reports,
    };
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| anyhow!("failed to encode replay report: {err}"))?;
    println!("{rendered}");

    Ok(())
}
