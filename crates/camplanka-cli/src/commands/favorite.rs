use camplanka_core::util::normalize_text_option;
use camplanka_core::WishlistItem;

use crate::commands::common::{normalize_identifier, normalize_name, Workspace};
use crate::error::CliError;

pub async fn run_favorite(
    campground_id: &str,
    name: &str,
    location: Option<String>,
    rating: Option<f64>,
    workspace: &Workspace,
) -> Result<(), CliError> {
    let id = normalize_identifier(campground_id)?;
    let mut item = WishlistItem::new(id, normalize_name(name)?);
    if let Some(location) = normalize_text_option(location) {
        item = item.with_location(location);
    }
    if let Some(rating) = rating {
        item = item.with_rating(rating);
    }

    let flag = workspace.context().favorite(item);
    flag.refresh().await?;
    let favorite = flag.toggle().await?;
    workspace.save().await?;

    let name = &flag.item().name;
    if favorite {
        println!("Added {name} to favorites");
    } else {
        println!("Removed {name} from favorites");
    }
    Ok(())
}
