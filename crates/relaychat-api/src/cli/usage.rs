//! Quota inspection and reset commands.

use anyhow::Result;
use console::style;

use relaychat_types::identity::Identity;
use relaychat_types::usage::UsageStatus;

use crate::state::AppState;

/// Print the quota status of an authenticated user.
pub async fn show_usage(state: &AppState, user: &str, json: bool) -> Result<()> {
    let identity = Identity::user(user);
    let status = state.chat_service.usage(&identity).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    print_status(&identity, &status);
    Ok(())
}

/// Reset the quota of an authenticated user and print the new status.
pub async fn reset_usage(state: &AppState, user: &str, json: bool) -> Result<()> {
    let identity = Identity::user(user);
    let status = state.chat_service.reset_usage(&identity).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Usage reset for {}",
        style("✓").green().bold(),
        style(&identity).cyan()
    );
    print_status(&identity, &status);
    Ok(())
}

fn print_status(identity: &Identity, status: &UsageStatus) {
    println!();
    println!("  {}", style(format!("── Usage: {identity} ──")).dim());
    println!(
        "  Remaining: {}",
        if status.is_limited {
            style(status.remaining_messages).red().bold()
        } else {
            style(status.remaining_messages).green().bold()
        }
    );

    if let Some(info) = &status.limit_info {
        println!("  Limit:     {} messages", info.limit);
        println!(
            "  Resets at: {} UTC ({}s)",
            style(&info.reset_time).yellow(),
            info.remaining_time
        );
    }
    println!();
}
