use camplanka_core::models::IS_FAVORITE;

use crate::cli::WishlistCommands;
use crate::commands::common::{format_wishlist_lines, normalize_identifier, wait_live, Workspace};
use crate::error::CliError;

pub async fn run_wishlist(command: WishlistCommands, workspace: &Workspace) -> Result<(), CliError> {
    match command {
        WishlistCommands::List { json } => run_wishlist_list(json, workspace).await,
        WishlistCommands::Toggle { id } => run_wishlist_toggle(&id, workspace).await,
    }
}

pub async fn run_wishlist_list(as_json: bool, workspace: &Workspace) -> Result<(), CliError> {
    let wishlist = workspace.context().wishlist();
    let view = wait_live(&wishlist, "wishlist").await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view.entities)?);
    } else if view.entities.is_empty() {
        println!("Your wishlist is empty");
    } else {
        for line in format_wishlist_lines(&view.entities) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_wishlist_toggle(id: &str, workspace: &Workspace) -> Result<(), CliError> {
    let id = normalize_identifier(id)?;
    let wishlist = workspace.context().wishlist();
    let view = wait_live(&wishlist, "wishlist").await?;
    let Some(item) = view.get(&id) else {
        return Err(CliError::NotFound {
            kind: "Wishlist entry",
            id,
        });
    };
    let name = item.name.clone();

    wishlist.toggle_flag(&id, IS_FAVORITE).await?;
    workspace.save().await?;

    let favorite = wishlist
        .view()
        .get(&id)
        .is_some_and(|item| item.is_favorite);
    if favorite {
        println!("Added {name} to favorites");
    } else {
        println!("Removed {name} from favorites");
    }
    Ok(())
}
