//! Chat history admin command.

use anyhow::Result;
use console::style;

use relaychat_types::identity::Identity;

use crate::state::AppState;

/// Delete every stored turn of an authenticated user.
///
/// The message quota is left untouched.
pub async fn clear_history(state: &AppState, user: &str, json: bool) -> Result<()> {
    let identity = Identity::user(user);
    state.chat_service.clear(&identity).await?;

    if json {
        let out = serde_json::json!({
            "identity": identity.storage_key(),
            "success": true,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Chat history cleared for {}",
        style("✓").green().bold(),
        style(&identity).cyan()
    );
    println!();
    Ok(())
}
