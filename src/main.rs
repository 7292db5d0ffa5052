//! School Console - command-line front end
//!
//! Thin presentation layer over the `school_console` library. Builds the
//! directory service and dashboard aggregator from configuration, runs one
//! command on a single-threaded runtime, and renders the result.

mod cli;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use school_console::api::{DirectoryApi, HttpApi, HttpApiConfig, LocalDirectory, SummaryApi};
use school_console::config::{self, ConsoleConfig};
use school_console::dashboard::{Dashboard, DashboardAggregator, SchoolJoin};
use school_console::directory::{
    RefreshOutcome, SchoolDirectoryService, StatusFilter, DEFAULT_SCHOOL_FIELDS,
};
use school_console::error::Error;
use school_console::logging;
use school_console::notify::{Notifier, TracingNotifier};
use school_console::seed::{FileStore, SeedStore};
use school_console::types::{require_user, Board, CurrentUser, NewSchool, School, SchoolId};

use crate::cli::{Cli, Commands, ConfigSubcommand, SchoolArgs, SchoolsSubcommand, SeedSubcommand};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<Error>() {
            Some(e) => {
                eprint!("{}", e.format_for_terminal());
                std::process::exit(e.exit_code());
            }
            None => {
                eprintln!("\x1b[31mError\x1b[0m: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Config commands use minimal logging
    if let Commands::Config { subcommand } = &cli.command {
        logging::init_simple(tracing::Level::WARN)?;
        return handle_config_command(subcommand.clone(), cli.config.as_deref());
    }

    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(ref role) = cli.role {
        config.session.role = Some(role.clone());
    }
    if let Some(ref school_id) = cli.school_id {
        config.session.school_id = Some(school_id.clone());
    }
    config.validate()?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        remote = config.has_remote(),
        "Starting school console"
    );

    let user = config.current_user()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    match cli.command {
        Commands::Schools { subcommand } => {
            let console = Console::build(&config, cli.json)?;
            runtime.block_on(console.schools(subcommand, user.as_ref()))
        }
        Commands::Dashboard => {
            let console = Console::build(&config, cli.json)?;
            runtime.block_on(console.dashboard(user.as_ref()))
        }
        Commands::Seed { subcommand } => handle_seed_command(&config, subcommand, cli.json),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

// ─────────────────────────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────────────────────────

fn open_seed_store(config: &ConsoleConfig) -> anyhow::Result<SeedStore> {
    let path = config.seed_path();
    debug!(path = %path.display(), "Opening local seed store");
    Ok(SeedStore::new(Arc::new(FileStore::open(path)?)))
}

struct Console {
    directory: SchoolDirectoryService,
    dashboard: DashboardAggregator,
    json: bool,
}

impl Console {
    fn build(config: &ConsoleConfig, json: bool) -> anyhow::Result<Self> {
        let directory_api: Arc<dyn DirectoryApi>;
        let summary_api: Arc<dyn SummaryApi>;

        if config.has_remote() {
            let http = Arc::new(HttpApi::new(HttpApiConfig::from(&config.api))?);
            directory_api = http.clone();
            summary_api = http;
        } else {
            info!("No API base URL configured, using the local seed store");
            let local = Arc::new(LocalDirectory::new(Arc::new(open_seed_store(config)?)));
            directory_api = local.clone();
            summary_api = local;
        }

        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        Ok(Self {
            directory: SchoolDirectoryService::new(directory_api.clone(), notifier.clone()),
            dashboard: DashboardAggregator::new(summary_api, directory_api, notifier),
            json,
        })
    }

    async fn schools(
        &self,
        subcommand: SchoolsSubcommand,
        user: Option<&CurrentUser>,
    ) -> anyhow::Result<()> {
        match subcommand {
            SchoolsSubcommand::List { inactive } => {
                let schools = self.load_filter(StatusFilter::from_flag(!inactive)).await?;
                self.print_schools(&schools)
            }
            SchoolsSubcommand::Search {
                term,
                fields,
                inactive,
            } => {
                self.load_filter(StatusFilter::from_flag(!inactive)).await?;
                let hits = if fields.is_empty() {
                    self.directory.search_view(&term, DEFAULT_SCHOOL_FIELDS)
                } else {
                    self.directory.search_view(&term, fields.as_slice())
                };
                self.print_schools(&hits)
            }
            SchoolsSubcommand::Show { id } => {
                let school = self.directory.get_by_id(&SchoolId::from(id)).await?;
                self.print_school(&school)
            }
            SchoolsSubcommand::Deactivate { id, yes } => {
                self.transition(user, SchoolId::from(id), false, yes).await
            }
            SchoolsSubcommand::Reactivate { id, yes } => {
                self.transition(user, SchoolId::from(id), true, yes).await
            }
            SchoolsSubcommand::Boards { school } => {
                let school = school.map(SchoolId::from);
                let boards = self.directory.boards(school.as_ref()).await?;
                self.print_boards(&boards)
            }
            SchoolsSubcommand::Create { school, boards } => {
                let mut draft = new_school(school);
                draft.board_ids = boards;
                let created = self.directory.register(draft).await?;
                self.print_school(&created)
            }
        }
    }

    /// Select a filter and return the visible list, or the read failure
    async fn load_filter(&self, filter: StatusFilter) -> anyhow::Result<Vec<School>> {
        let outcome = self.directory.select_filter(filter).await;
        let view = self.directory.view();
        match outcome {
            RefreshOutcome::Failed => Err(Error::fetch_failed(
                "school list",
                view.last_error.unwrap_or_default(),
            )
            .into()),
            _ => Ok(view.schools),
        }
    }

    async fn transition(
        &self,
        user: Option<&CurrentUser>,
        id: SchoolId,
        target_active: bool,
        assume_yes: bool,
    ) -> anyhow::Result<()> {
        let user = require_user(user)?;
        let school = self.directory.get_by_id(&id).await?;
        let pending = self
            .directory
            .request_transition(user, &school, target_active)?;

        if !assume_yes && !ask_confirmation(&pending.prompt())? {
            pending.cancel();
            println!("Cancelled. No changes were made.");
            return Ok(());
        }

        let message = pending.confirm().await?;
        if self.json {
            println!("{}", serde_json::json!({ "school_id": id, "message": message }));
        } else {
            println!("{}", message);
        }
        Ok(())
    }

    async fn dashboard(&self, user: Option<&CurrentUser>) -> anyhow::Result<()> {
        let user = require_user(user)?;
        let dashboard = self.dashboard.load(user).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        } else {
            print_dashboard(&dashboard);
        }
        Ok(())
    }

    fn print_schools(&self, schools: &[School]) -> anyhow::Result<()> {
        print_schools(schools, self.json)
    }

    fn print_school(&self, school: &School) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(school)?);
            return Ok(());
        }
        println!("{} ({})", school.name, school.id);
        println!("  Status:   {}", status_label(school.is_active));
        println!("  Address:  {}", school.address);
        println!("  Phone:    {}", school.phone);
        println!("  Email:    {}", school.email);
        if let Some(ref admin) = school.admin_id {
            println!("  Admin:    {}", admin);
        }
        println!("  Teachers: {}", school.teacher_count);
        println!("  Students: {}", school.student_count);
        println!("  Boards:   {}", school.board_names().join(", "));
        Ok(())
    }

    fn print_boards(&self, boards: &[Board]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(boards)?);
            return Ok(());
        }
        if boards.is_empty() {
            println!("No boards.");
        }
        for board in boards {
            println!("{:<6} {}", board.id, board.name);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────

fn status_label(is_active: bool) -> &'static str {
    if is_active {
        "active"
    } else {
        "inactive"
    }
}

fn print_schools(schools: &[School], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(schools)?);
        return Ok(());
    }
    if schools.is_empty() {
        println!("No schools found.");
        return Ok(());
    }
    println!("{:<14} {:<40} {:<9} ADDRESS", "ID", "NAME", "STATUS");
    for school in schools {
        println!(
            "{:<14} {:<40} {:<9} {}",
            school.id,
            school.name,
            status_label(school.is_active),
            school.address
        );
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let metrics = &dashboard.metrics;
    println!("Dashboard ({})", metrics.role);
    if metrics.unavailable {
        println!("  Summary unavailable; showing default values.");
    }
    for metric in &metrics.metrics {
        println!("  {:<20} {:>8}   {}", metric.label, metric.value, metric.link);
    }

    match dashboard.school {
        SchoolJoin::NotApplicable => {}
        SchoolJoin::Loaded(ref card) => {
            println!();
            println!("{} ({})", card.name, card.id);
            println!("  Address: {}", card.address);
            println!("  Phone:   {}", card.phone);
            println!("  Email:   {}", card.email);
            println!("  Boards:  {}", card.boards.join(", "));
        }
        SchoolJoin::Unavailable(ref reason) => {
            println!();
            println!("School details unavailable: {}", reason);
        }
    }
}

/// Ask a yes/no question on the terminal. Anything but "y"/"yes" is a no.
fn ask_confirmation(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush().context("Failed to write prompt")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn new_school(args: SchoolArgs) -> NewSchool {
    let mut draft = NewSchool::new(args.name);
    draft.address = args.address;
    draft.phone = args.phone;
    draft.email = args.email;
    draft.admin_id = args.admin;
    draft
}

// ─────────────────────────────────────────────────────────────────
// Seed and config commands
// ─────────────────────────────────────────────────────────────────

fn handle_seed_command(config: &ConsoleConfig, subcommand: SeedSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_seed_store(config)?;

    match subcommand {
        SeedSubcommand::Show => {
            let schools: Vec<School> = store.load()?;
            print_schools(&schools, json)
        }
        SeedSubcommand::Add { school } => {
            let created: School = store.add_entity(new_school(school))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&created)?);
            } else {
                println!("Added {} ({})", created.name, created.id);
            }
            Ok(())
        }
    }
}

fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> anyhow::Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let mut cfg = ConsoleConfig::load(config_path)?;
            if cfg.api.auth_token.is_some() {
                cfg.api.auth_token = Some("********".to_string());
            }
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate => {
            ConsoleConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
