use camplanka_core::ChatMessage;

use crate::cli::ChatCommands;
use crate::commands::common::{format_chat_lines, normalize_identifier, wait_live, Workspace};
use crate::error::CliError;

pub async fn run_chat(command: ChatCommands, workspace: &Workspace) -> Result<(), CliError> {
    match command {
        ChatCommands::List { plan_id, json } => run_chat_list(&plan_id, json, workspace).await,
        ChatCommands::Send { plan_id, text } => {
            run_chat_send(&plan_id, &text, workspace).await.map(|_| ())
        }
    }
}

pub async fn run_chat_list(plan_id: &str, as_json: bool, workspace: &Workspace) -> Result<(), CliError> {
    let plan_id = normalize_identifier(plan_id)?;
    let chat = workspace.context().chat(&plan_id);
    let view = wait_live(&chat, "chat").await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view.entities)?);
    } else if view.entities.is_empty() {
        println!("No messages yet");
    } else {
        for line in format_chat_lines(&view.entities, &workspace.user().id) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Send a message as the workspace user. Returns the message id.
pub async fn run_chat_send(
    plan_id: &str,
    text_parts: &[String],
    workspace: &Workspace,
) -> Result<String, CliError> {
    let plan_id = normalize_identifier(plan_id)?;
    let text = normalize_message(text_parts)?;

    let user = workspace.user();
    let message = ChatMessage::new(user.id.clone(), user.label(), text);
    let id = message.id.clone();

    let chat = workspace.context().chat(&plan_id);
    wait_live(&chat, "chat").await?;
    chat.add(message).await?;
    workspace.save().await?;

    println!("{id}");
    Ok(id)
}

pub fn normalize_message(parts: &[String]) -> Result<String, CliError> {
    let text = parts.join(" ");
    let text = text.trim();
    if text.is_empty() {
        Err(CliError::EmptyMessage)
    } else {
        Ok(text.to_string())
    }
}
