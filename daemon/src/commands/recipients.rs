//! The `recipients` command: manage who receives expiry alerts.
//!
//! Edits go straight to the recipient store; a running monitor picks them
//! up on its next alert.

use anyhow::Context;
use clap::Subcommand;
use menuwatch_core::{AppConfig, Recipient};
use menuwatch_store::RecipientStore;

#[derive(Subcommand)]
pub enum RecipientAction {
    /// List all recipients.
    List,
    /// Add an active recipient.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        chat_id: String,
    },
    /// Remove a recipient.
    Remove { id: String },
    /// Resume alerts for a recipient.
    Enable { id: String },
    /// Pause alerts for a recipient.
    Disable { id: String },
}

pub async fn handle(config: &AppConfig, action: RecipientAction) -> anyhow::Result<()> {
    let data_dir = config
        .data_dir()
        .context("could not determine data directory")?;
    let store = RecipientStore::in_dir(&data_dir);

    match action {
        RecipientAction::List => {
            let all = store.list().await?;
            if all.is_empty() {
                println!("No recipients.");
            }
            for recipient in &all {
                println!("{}", describe(recipient));
            }
        }
        RecipientAction::Add { name, chat_id } => {
            let recipient = store.add(&name, &chat_id).await?;
            println!("Added {}", describe(&recipient));
        }
        RecipientAction::Remove { id } => {
            store.remove(&id).await?;
            println!("Removed {id}");
        }
        RecipientAction::Enable { id } => {
            let recipient = store.set_active(&id, true).await?;
            println!("Enabled {}", describe(&recipient));
        }
        RecipientAction::Disable { id } => {
            let recipient = store.set_active(&id, false).await?;
            println!("Disabled {}", describe(&recipient));
        }
    }
    Ok(())
}

fn describe(recipient: &Recipient) -> String {
    let state = if recipient.active { "active" } else { "paused" };
    format!(
        "{}  {} ({})  [{state}]",
        recipient.id, recipient.name, recipient.chat_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_marks_paused() {
        let mut recipient = Recipient::new("Kitchen", "-1001");
        assert!(describe(&recipient).ends_with("[active]"));
        recipient.active = false;
        let line = describe(&recipient);
        assert!(line.contains("Kitchen (-1001)"));
        assert!(line.ends_with("[paused]"));
    }
}
