//! Command handlers.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use rollcall_core::config::Config;
use rollcall_core::models::Record;
use rollcall_core::{ApiClient, ApiError, QueryParams, SessionStatus, StudentQuery};

use crate::output;
use crate::{Command, StudentArgs};

/// Smallest allowed polling interval for `watch`
const MIN_WATCH_INTERVAL_SECS: u64 = 1;

pub async fn run(command: Command, config: &mut Config, client: &ApiClient) -> Result<()> {
    match command {
        Command::Login { id } => login(id, config, client).await,
        Command::Logout => {
            client.logout()?;
            println!("You have been logged out.");
            Ok(())
        }
        Command::Status => {
            output::print_status(&client.session().status()?);
            Ok(())
        }
        Command::Watch { interval } => watch(client, interval).await,
        Command::Students(args) => students(client, args).await,
        Command::Query { kind, params } => {
            require_active_session(client)?;
            let params: QueryParams = params.into_iter().collect();
            let page = client.query_records::<Record>(kind, &params).await?;
            output::print_page(&page);
            Ok(())
        }
    }
}

async fn login(id: Option<String>, config: &mut Config, client: &ApiClient) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => prompt_user_id(config.last_user_id.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("Authenticating...");
    client.login(&id, &password).await?;

    config.last_user_id = Some(id);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful!\n");
    output::print_status(&client.session().status()?);
    Ok(())
}

fn prompt_user_id(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("User id [{}]: ", last),
        None => print!("User id: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read user id")?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

/// Skip requests that the stored token can no longer authorize.
/// The server still has the final say through its 401.
fn require_active_session(client: &ApiClient) -> Result<()> {
    match client.session().status()? {
        SessionStatus::Active { .. } => Ok(()),
        SessionStatus::Missing => Err(ApiError::MissingCredential.into()),
        status => anyhow::bail!("{}. {}", status.label(), output::LOGIN_HINT),
    }
}

async fn students(client: &ApiClient, args: StudentArgs) -> Result<()> {
    require_active_session(client)?;

    let query = StudentQuery {
        keyword: args.keyword,
        department: args.department,
        email: args.email,
        age: args.age,
        size: args.size,
        index: args.index,
    };
    let page = client.query_students(&query).await?;
    output::print_page(&page);
    Ok(())
}

/// Print the session status whenever it changes
async fn watch(client: &ApiClient, interval_secs: u64) -> Result<()> {
    let period = Duration::from_secs(interval_secs.max(MIN_WATCH_INTERVAL_SECS));
    let mut ticker = tokio::time::interval(period);
    let mut last_label: Option<&'static str> = None;
    let mut warned_soon = false;

    info!(interval_secs = period.as_secs(), "Watching session status");
    loop {
        ticker.tick().await;
        let status = client.session().status()?;

        if last_label != Some(status.label()) {
            output::print_status_line(&status);
            last_label = Some(status.label());
            warned_soon = false;
        }
        if status.expires_soon() && !warned_soon {
            println!("Session expires soon. {}", output::LOGIN_HINT);
            warned_soon = true;
        }
    }
}
