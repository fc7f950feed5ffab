//! `todolists`: command-line front end for the todolists client.
//!
//! Every subcommand drives the store through [`TodolistsClient`] and prints
//! the resulting state, or the user-facing error message.

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use todolists_api::{ApiError, DomainTask, LoginInputs, TaskId, TodolistId};
use todolists_app::config::{ENV_API_KEY, ENV_BASE_URL, ENV_REQUEST_TIMEOUT_SECS, ENV_TOKEN};
use todolists_app::{ClientConfig, FilterValue, TodolistsClient};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "todolists", about = "Manage todolists and their tasks")]
struct Cli {
    /// API base URL (overrides TODOLISTS_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// API key (overrides TODOLISTS_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Bearer token from `todolists login` (overrides TODOLISTS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    /// Request timeout in seconds (overrides TODOLISTS_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Command-line value for a configuration variable, if given
    fn setting(&self, name: &str) -> Option<String> {
        match name {
            ENV_BASE_URL => self.base_url.clone(),
            ENV_API_KEY => self.api_key.clone(),
            ENV_TOKEN => self.token.clone(),
            ENV_REQUEST_TIMEOUT_SECS => self.timeout.map(|secs| secs.to_string()),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Log in and print the bearer token
    Login(LoginArgs),
    /// End the session
    Logout,
    /// Show the logged-in account
    Me,
    /// List todolists
    Lists,
    /// Create a todolist
    AddList(TitleArgs),
    /// Delete a todolist and its tasks
    RmList(ListArgs),
    /// Rename a todolist
    RenameList(RenameListArgs),
    /// List the tasks of a todolist
    Tasks(TasksArgs),
    /// Create a task
    AddTask(AddTaskArgs),
    /// Delete a task
    RmTask(TaskArgs),
    /// Rename a task
    RenameTask(RenameTaskArgs),
    /// Flip a task between new and completed
    ToggleTask(TaskArgs),
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "TODOLISTS_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    remember_me: bool,
}

#[derive(Args)]
struct TitleArgs {
    title: String,
}

#[derive(Args)]
struct ListArgs {
    #[arg(help = "Todolist identifier")]
    id: String,
}

#[derive(Args)]
struct RenameListArgs {
    #[arg(help = "Todolist identifier")]
    id: String,
    title: String,
}

#[derive(Args)]
struct TasksArgs {
    #[arg(help = "Todolist identifier")]
    todolist_id: String,
    #[arg(long, value_enum, default_value_t = FilterArg::All)]
    filter: FilterArg,
}

#[derive(Args)]
struct AddTaskArgs {
    #[arg(help = "Todolist identifier")]
    todolist_id: String,
    title: String,
}

#[derive(Args)]
struct TaskArgs {
    #[arg(help = "Todolist identifier")]
    todolist_id: String,
    #[arg(help = "Task identifier")]
    task_id: String,
}

#[derive(Args)]
struct RenameTaskArgs {
    #[arg(help = "Todolist identifier")]
    todolist_id: String,
    #[arg(help = "Task identifier")]
    task_id: String,
    title: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for FilterValue {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::All => Self::All,
            FilterArg::Active => Self::Active,
            FilterArg::Completed => Self::Completed,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_lookup(|name| {
        cli.setting(name).or_else(|| std::env::var(name).ok())
    })
    .context("invalid configuration")?;
    init_tracing(&config.log_filter);

    let client = TodolistsClient::from_config(&config).context("failed to create client")?;
    dispatch(&client, cli.command).await
}

/// Turn an operation failure into the message a user should see
fn report(error: &ApiError) -> anyhow::Error {
    let violations = error.field_violations();
    if violations.is_empty() {
        return anyhow!(error.user_message());
    }
    let fields = violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ");
    anyhow!("{} ({fields})", error.user_message())
}

async fn dispatch(client: &TodolistsClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login(args) => {
            let inputs = LoginInputs {
                email: args.email,
                password: args.password,
                remember_me: args.remember_me,
            };
            let data = client.login(inputs).await.map_err(|e| report(&e))?;
            println!("Logged in as user {}", data.user_id);
            println!("export {ENV_TOKEN}={}", data.token);
        },
        Command::Logout => {
            client.logout().await.map_err(|e| report(&e))?;
            println!("Logged out");
        },
        Command::Me => {
            let user = client.initialize().await.map_err(|e| report(&e))?;
            println!("{} <{}> (id {})", user.login, user.email, user.id);
        },
        Command::Lists => {
            client.fetch_todolists().await.map_err(|e| report(&e))?;
            print_todolists(client).await;
        },
        Command::AddList(args) => {
            let todolist = client.create_todolist(args.title).await.map_err(|e| report(&e))?;
            println!("{}\t{}", todolist.id, todolist.title);
        },
        Command::RmList(args) => {
            client
                .delete_todolist(TodolistId::new(args.id))
                .await
                .map_err(|e| report(&e))?;
            println!("Deleted");
        },
        Command::RenameList(args) => {
            let id = TodolistId::new(args.id);
            let title = client
                .rename_todolist(id.clone(), args.title)
                .await
                .map_err(|e| report(&e))?;
            println!("{id}\t{title}");
        },
        Command::Tasks(args) => {
            let todolist_id = TodolistId::new(args.todolist_id);
            load_bucket(client, &todolist_id).await?;
            client
                .change_filter(todolist_id.clone(), args.filter.into())
                .await
                .map_err(|e| report(&e))?;
            let tasks = client.filtered_tasks(&todolist_id).await.unwrap_or_default();
            print_tasks(&tasks);
        },
        Command::AddTask(args) => {
            let task = client
                .create_task(TodolistId::new(args.todolist_id), args.title)
                .await
                .map_err(|e| report(&e))?;
            print_tasks(&[task]);
        },
        Command::RmTask(args) => {
            client
                .delete_task(TodolistId::new(args.todolist_id), TaskId::new(args.task_id))
                .await
                .map_err(|e| report(&e))?;
            println!("Deleted");
        },
        Command::RenameTask(args) => {
            let todolist_id = TodolistId::new(args.todolist_id);
            load_bucket(client, &todolist_id).await?;
            let task = client
                .rename_task(todolist_id, TaskId::new(args.task_id), args.title)
                .await
                .map_err(|e| report(&e))?;
            print_tasks(&[task]);
        },
        Command::ToggleTask(args) => {
            let todolist_id = TodolistId::new(args.todolist_id);
            load_bucket(client, &todolist_id).await?;
            let task = client
                .toggle_task(todolist_id, TaskId::new(args.task_id))
                .await
                .map_err(|e| report(&e))?;
            print_tasks(&[task]);
        },
    }
    Ok(())
}

/// Tasks are only kept for loaded todolists, so load both
async fn load_bucket(client: &TodolistsClient, todolist_id: &TodolistId) -> anyhow::Result<()> {
    client.fetch_todolists().await.map_err(|e| report(&e))?;
    if client.filtered_tasks(todolist_id).await.is_none() {
        return Err(anyhow!("todolist {todolist_id} not found"));
    }
    client
        .fetch_tasks(todolist_id.clone())
        .await
        .map_err(|e| report(&e))?;
    Ok(())
}

async fn print_todolists(client: &TodolistsClient) {
    let todolists = client.todolists().await;
    if todolists.is_empty() {
        println!("No todolists");
    }
    for todolist in todolists {
        println!("{}\t{}", todolist.id(), todolist.title());
    }
}

fn print_tasks(tasks: &[DomainTask]) {
    if tasks.is_empty() {
        println!("No tasks");
    }
    for task in tasks {
        let mark = if task.status.is_completed() { 'x' } else { ' ' };
        println!("[{mark}] {}\t{}", task.id, task.title);
    }
}
