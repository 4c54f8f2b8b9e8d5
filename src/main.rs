use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use shelf::app_state::AppState;
use shelf::config::app_config::AppConfig;
use shelf::drafts::{BookDialogs, Dialog, Draft};
use shelf::models::auth::SignupForm;
use shelf::models::book::{Book, BookId};

#[derive(Parser)]
#[command(name = "shelf", about = "Manage the books of a library server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register { name: String, email: String, password: String },
    /// Log in and keep the token for later commands
    Login { email: String, password: String },
    Logout,
    /// List books, optionally filtered by title or author
    List {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    Show { id: String },
    Add(BookArgs),
    Edit {
        id: String,
        #[command(flatten)]
        changes: BookArgs,
    },
    Delete { id: String },
    /// Point the client at another server
    Configure {
        #[arg(long)]
        api_url: String,
    },
}

#[derive(Args)]
struct BookArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl BookArgs {
    fn apply(self, draft: &mut Draft) {
        let fields = [
            (self.title, &mut draft.title),
            (self.author, &mut draft.author),
            (self.year, &mut draft.year),
            (self.genre, &mut draft.genre),
            (self.description, &mut draft.description),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::new().context("failed to load shelf configuration")?;

    if let Command::Configure { api_url } = &cli.command {
        let config = AppConfig { api_url: api_url.clone(), ..config };
        AppConfig::write_config(&config).context("failed to write configuration")?;
        println!("Using {}", config.api_url);
        return Ok(());
    }

    let state = AppState::new(Arc::new(config))?;
    run(state, cli.command).await
}

async fn run(state: AppState, command: Command) -> anyhow::Result<()> {
    let mut dialogs = BookDialogs::new();

    match command {
        Command::Register { name, email, password } => {
            let message = state.register(&SignupForm::new(name, email, password)).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            println!("{}", message);
        }
        Command::Login { email, password } => {
            state.login(&email, &password).await
                .map_err(|_| anyhow::anyhow!("Login failed. Please check your credentials."))?;
            println!("Logged in. {} books in the library.", state.books.len());
        }
        Command::Logout => {
            state.logout()?;
            println!("Logged out.");
        }
        Command::List { query } => {
            state.books.refresh().await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            let books = state.books.filter(&query);
            if books.is_empty() {
                println!("No books found.");
            }
            books.iter().for_each(print_book);
        }
        Command::Show { id } => {
            let draft = dialogs.open_details(&state.books, &BookId::from(id)).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            print_draft(draft);
        }
        Command::Add(args) => {
            args.apply(dialogs.open_add());
            let book = dialogs.submit(Dialog::Add, &state.books).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            report(&state, &book);
        }
        Command::Edit { id, changes } => {
            let draft = dialogs.open_edit(&state.books, &BookId::from(id)).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            changes.apply(draft);
            let book = dialogs.submit(Dialog::Edit, &state.books).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            report(&state, &book);
        }
        Command::Delete { id } => {
            state.books.remove(&BookId::from(id)).await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            if let Some(message) = state.books.snapshot().success_message {
                println!("{}", message);
            }
        }
        Command::Configure { .. } => bail!("configure is handled before connecting"),
    }

    Ok(())
}

fn report(state: &AppState, book: &Book) {
    let snapshot = state.books.snapshot();
    if let Some(message) = snapshot.success_message {
        println!("{}", message);
    }
    print_book(book);
}

fn print_book(book: &Book) {
    let year = book.year.map(|year| format!(" ({})", year)).unwrap_or_default();
    println!("[{}] {} by {}{}", book.id, book.title, book.author, year);
}

fn print_draft(draft: &Draft) {
    println!("{}", draft.title);
    println!("  by {}", draft.author);
    if !draft.year.is_empty() {
        println!("  published {}", draft.year);
    }
    if !draft.genre.is_empty() {
        println!("  genre {}", draft.genre);
    }
    if draft.description.is_empty() {
        println!("  No description available.");
    } else {
        println!("  {}", draft.description);
    }
}
