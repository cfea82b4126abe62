//! Command-line front end for the card board.
//!
//! # Responsibility
//! - Open the board database and config, run one command, save.
//! - Print columns as indented text so the store can be inspected without a UI.

use cardtree_core::{
    db, init_logging, EngineConfig, ForestStore, ProjectRepository, SqliteKvStore, Workspace,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cardtree")]
#[command(about = "Hierarchical multi-column card board", long_about = None)]
struct Cli {
    /// Board database file (in-memory when omitted)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Engine config file
    #[arg(long, global = true, default_value = "cardtree.toml")]
    config: PathBuf,

    /// Directory for rotating log files (logging stays off when omitted)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print every column of the active project
    Show,

    /// List projects, newest first
    #[command(alias = "ls")]
    Projects,

    /// Create a project and make it active
    NewProject {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Make a project active
    Switch { project_id: String },

    /// Add a root card at the end of column 0
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Add a card at the end of a parent's children
    Child {
        parent_id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Replace a card's content
    Edit {
        card_id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a card and its descendants
    #[command(alias = "rm")]
    Delete { card_id: String },

    /// Set a column prompt
    Prompt {
        column: usize,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Append an empty column
    AddColumn,

    /// Print the core version
    Version,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Show => "show",
            Command::Projects => "projects",
            Command::NewProject { .. } => "new-project",
            Command::Switch { .. } => "switch",
            Command::Add { .. } => "add",
            Command::Child { .. } => "child",
            Command::Edit { .. } => "edit",
            Command::Delete { .. } => "delete",
            Command::Prompt { .. } => "prompt",
            Command::AddColumn => "add-column",
            Command::Version => "version",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = EngineConfig::load(&cli.config)?;
    if let Some(log_dir) = &cli.log_dir {
        init_logging(config.log_level(), log_dir)?;
    }

    let conn = match &cli.db {
        Some(path) => db::open_db(path)?,
        None => db::open_db_in_memory()?,
    };
    let repo = ProjectRepository::new(SqliteKvStore::try_new(&conn)?);
    let mut workspace = Workspace::load(&repo, config.palette());

    if execute(&mut workspace, &cli.command)? {
        workspace.save(&repo)?;
        info!(
            "event=cli_command module=cli status=ok command={}",
            cli.command.name()
        );
    }
    Ok(())
}

/// Runs one command. Returns whether the workspace must be saved.
fn execute(workspace: &mut Workspace, command: &Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Show => {
            print_board(workspace.store());
            Ok(false)
        }
        Command::Projects => {
            for summary in workspace.list_projects() {
                let marker = if summary.id == workspace.active_project_id() {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}  {}", summary.id, summary.title);
            }
            Ok(false)
        }
        Command::NewProject { title } => {
            let id = workspace.create_project(title.join(" "));
            println!("{id}");
            Ok(true)
        }
        Command::Switch { project_id } => {
            if !workspace.switch_project(project_id) {
                return Err(format!("unknown project `{project_id}`").into());
            }
            Ok(true)
        }
        Command::Add { text } => {
            let store = workspace.store_mut();
            let card = store.insert_card(None, None);
            store.update_content(&card.id, text.join(" "));
            println!("{}", card.id);
            Ok(true)
        }
        Command::Child { parent_id, text } => {
            let store = workspace.store_mut();
            if store.get_card(parent_id).is_none() {
                return Err(format!("unknown card `{parent_id}`").into());
            }
            let card = store.insert_card(Some(parent_id.as_str()), None);
            store.update_content(&card.id, text.join(" "));
            println!("{}", card.id);
            Ok(true)
        }
        Command::Edit { card_id, text } => {
            if !workspace.store_mut().update_content(card_id, text.join(" ")) {
                return Err(format!("unknown card `{card_id}`").into());
            }
            Ok(true)
        }
        Command::Delete { card_id } => {
            let outcome = workspace.store_mut().delete_subtree(card_id);
            if outcome.is_empty() {
                return Err(format!("unknown card `{card_id}`").into());
            }
            println!("deleted {} card(s)", outcome.removed_ids.len());
            Ok(true)
        }
        Command::Prompt { column, text } => {
            if !workspace.store_mut().set_column_prompt(*column, text.join(" ")) {
                return Err(format!("unknown column {column}").into());
            }
            Ok(true)
        }
        Command::AddColumn => {
            let index = workspace.store_mut().add_column();
            println!("column {index}");
            Ok(true)
        }
        Command::Version => {
            println!("cardtree_core {}", cardtree_core::core_version());
            Ok(false)
        }
    }
}

fn print_board(store: &ForestStore) {
    println!("# {}", store.project().title);
    for (index, column) in store.columns().iter().enumerate() {
        println!();
        if column.prompt.is_empty() {
            println!("## column {index}");
        } else {
            println!("## column {index}  ({})", column.prompt);
        }
        for card in store.get_column_cards(index) {
            let first_line = card.content.lines().next().unwrap_or("");
            let label = card.name.as_deref().unwrap_or(first_line);
            println!("  {} {}  {}", card.color, card.id, label);
        }
    }
}
