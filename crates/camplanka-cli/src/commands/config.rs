use std::path::PathBuf;

use camplanka_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::commands::common::normalize_identifier;
use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    user: Option<&str>,
    data: Option<PathBuf>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { display_name } => {
            let path = default_config_path().map_err(CliError::Config)?;
            let mut config = CliConfig::load_from_path(&path).map_err(CliError::Config)?;
            update_config(&mut config, user, display_name, data)?;
            config.save_to_path(&path).map_err(CliError::Config)?;
            println!("Saved config to {}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let effective = CliConfig {
                user_id: config.resolve_user(user),
                data_path: Some(config.resolve_data_path(data).map_err(CliError::Config)?),
                ..config
            };
            println!("{}", serde_json::to_string_pretty(&effective)?);
            Ok(())
        }
    }
}

/// Apply `config init` options; values not given keep their current setting.
pub fn update_config(
    config: &mut CliConfig,
    user: Option<&str>,
    display_name: Option<String>,
    data: Option<PathBuf>,
) -> Result<(), CliError> {
    if let Some(user) = normalize_text_option(user.map(str::to_string)) {
        config.user_id = Some(normalize_identifier(&user)?);
    }
    if let Some(display_name) = normalize_text_option(display_name) {
        config.display_name = Some(display_name);
    }
    if let Some(data) = data {
        config.data_path = Some(data);
    }
    Ok(())
}
