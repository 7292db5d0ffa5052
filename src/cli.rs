//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the school console.

use clap::{Parser, Subcommand};

/// School Console - multi-tenant school administration
///
/// Browse the school directory, activate or deactivate schools, and view the
/// role dashboard. Works against the school management API, or against a
/// local seed store when no API is configured.
#[derive(Parser, Debug)]
#[command(name = "school-console")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SCHOOL_CONSOLE_CONFIG")]
    pub config: Option<String>,

    /// Act as this role ("Super Admin", "Admin", "Teacher", "Student")
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Affiliated school id of the acting user
    #[arg(long, global = true)]
    pub school_id: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// School directory
    Schools {
        #[command(subcommand)]
        subcommand: SchoolsSubcommand,
    },

    /// Show the dashboard for the current role
    Dashboard,

    /// Local seed store
    Seed {
        #[command(subcommand)]
        subcommand: SeedSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// School directory subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SchoolsSubcommand {
    /// List active schools (or inactive ones)
    List {
        /// Show deactivated schools instead
        #[arg(long)]
        inactive: bool,
    },

    /// Search the school list
    Search {
        /// Case-insensitive text to look for
        term: String,

        /// Field to search (repeatable); defaults to name and address
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Search deactivated schools instead
        #[arg(long)]
        inactive: bool,
    },

    /// Show one school
    Show {
        /// School id
        id: String,
    },

    /// Deactivate a school (Super Admin only)
    Deactivate {
        /// School id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reactivate a school (Super Admin only)
    Reactivate {
        /// School id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List curriculum boards
    Boards {
        /// Only the boards attached to this school
        #[arg(long)]
        school: Option<String>,
    },

    /// Register a new school
    Create {
        #[command(flatten)]
        school: SchoolArgs,

        /// Board id to attach (repeatable)
        #[arg(long = "board")]
        boards: Vec<String>,
    },
}

/// Local seed store subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SeedSubcommand {
    /// Print the stored school collection (seeding it if absent)
    Show,

    /// Append a school to the local collection
    Add {
        #[command(flatten)]
        school: SchoolArgs,
    },
}

/// School fields shared by registration commands
#[derive(clap::Args, Debug, Clone)]
pub struct SchoolArgs {
    /// School name
    #[arg(long)]
    pub name: String,

    /// Postal address
    #[arg(long, default_value = "")]
    pub address: String,

    /// Contact phone
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Contact email
    #[arg(long, default_value = "")]
    pub email: String,

    /// Administrator user id
    #[arg(long)]
    pub admin: Option<String>,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}
