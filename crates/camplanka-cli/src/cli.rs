use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "camplanka")]
#[command(about = "Campground wishlists, trip plans and trip chat from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the local store file
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// User id to act as
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change your wishlist
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },
    /// Toggle the favorite flag of a campground
    Favorite {
        /// Campground ID
        campground_id: String,
        /// Campground name
        #[arg(long)]
        name: String,
        /// Campground location
        #[arg(long)]
        location: Option<String>,
        /// Campground rating
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Manage trip plans
    #[command(alias = "plan")]
    Plans {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Read or write a trip chat
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum WishlistCommands {
    /// List wishlist entries
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip the favorite flag of a wishlist entry
    Toggle {
        /// Campground ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List your trip plans
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a trip plan
    Add {
        /// Plan name
        name: String,
        /// Campground the trip goes to
        #[arg(long)]
        campground: Option<String>,
        /// First day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        end: Option<NaiveDate>,
        /// Invite a user (repeatable)
        #[arg(long = "participant", value_name = "ID")]
        participants: Vec<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a trip plan
    Remove {
        /// Plan ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Show the messages of a trip
    List {
        /// Plan ID
        plan_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a message to a trip
    Send {
        /// Plan ID
        plan_id: String,
        /// Message text
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the config file (uses --user and --data)
    Init {
        /// Name shown next to your chat messages
        #[arg(long, value_name = "NAME")]
        display_name: Option<String>,
    },
    /// Print the effective configuration
    Show,
}
