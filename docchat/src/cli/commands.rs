//! CLI command execution.
//!
//! Every command builds a [`ChatController`] over the HTTP gateway and the
//! configured session store; nothing talks to the backend directly.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::{Config, Overrides};
use crate::controller::{ChatController, ControllerError};
use crate::gateway::{Gateway, HttpGateway};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::validation::{collection_name_problem, is_valid_collection_name, sanitize_collection_name};

use super::args::{Cli, Commands};
use super::repl::run_repl;

/// Controller type used by the binary.
pub type Controller = ChatController<HttpGateway, Box<dyn SessionStore>>;

pub async fn execute(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Chat { collection: None });

    let overrides = Overrides {
        backend_url: cli.backend,
        session_file: cli.session_file,
    };
    let config = Config::load(&overrides)?;
    let mut controller = build_controller(&config, cli.ephemeral);

    match command {
        Commands::Login {
            username,
            password_stdin,
        } => login(&mut controller, username, password_stdin).await,
        Commands::Logout => logout(&mut controller),
        Commands::Status => status(&mut controller, &config).await,
        Commands::Ping => ping(&controller).await,
        Commands::Collections => list_collections(&mut controller).await,
        Commands::Upload { file, collection } => upload(&mut controller, &file, &collection).await,
        Commands::Ask {
            collection,
            question,
        } => ask(&mut controller, &collection, &question.join(" ")).await,
        Commands::Chat { collection } => run_repl(&mut controller, collection.as_deref()).await,
        Commands::CheckName { name } => check_name(&name),
    }
}

fn build_controller(config: &Config, ephemeral: bool) -> Controller {
    let store: Box<dyn SessionStore> = if ephemeral {
        Box::new(MemorySessionStore::new())
    } else {
        Box::new(FileSessionStore::new(&config.session_file))
    };
    ChatController::new(HttpGateway::new(&config.backend_url), store)
}

/// Resume the persisted session or explain how to get one.
async fn require_session(controller: &mut Controller) -> Result<()> {
    controller
        .start()
        .await
        .context("Failed to resume session")?;

    if !controller.is_logged_in() {
        let reason = controller
            .take_notice()
            .unwrap_or_else(|| "Not logged in.".to_string());
        bail!("{reason} Run `docchat login` first.");
    }
    Ok(())
}

/// Ask for a line on stdout and read it from stdin.
pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

async fn login(
    controller: &mut Controller,
    username: Option<String>,
    password_stdin: bool,
) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => prompt_line("Username: ")?,
    };
    if username.trim().is_empty() {
        bail!("Username is required");
    }

    let password = if password_stdin {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        prompt_password()?
    };

    match controller.login(username.trim(), &password).await {
        Ok(()) => {}
        // Logged in, but the first listing failed; the session itself is saved.
        Err(ControllerError::Gateway(e)) if controller.is_logged_in() => {
            eprintln!("Warning: could not list collections: {e}");
        }
        Err(e) => return Err(e).context("Login failed"),
    }

    println!("Logged in as {}.", username.trim());
    print_collections(controller.collections());
    Ok(())
}

fn logout(controller: &mut Controller) -> Result<()> {
    controller.logout().context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

async fn status(controller: &mut Controller, config: &Config) -> Result<()> {
    println!("Backend: {}", config.backend_url);
    println!("Session file: {}", config.session_file.display());

    controller
        .start()
        .await
        .context("Failed to check session")?;

    if let Some(notice) = controller.take_notice() {
        println!("{notice}");
    }
    if controller.is_logged_in() {
        println!(
            "Logged in ({} collection{}).",
            controller.collections().len(),
            if controller.collections().len() == 1 { "" } else { "s" }
        );
    } else {
        println!("Logged out.");
    }
    Ok(())
}

async fn ping(controller: &Controller) -> Result<()> {
    let banner = controller
        .gateway()
        .health()
        .await
        .with_context(|| format!("Backend at {} is not reachable", controller.gateway().base_url()))?;
    println!("{banner}");
    Ok(())
}

async fn list_collections(controller: &mut Controller) -> Result<()> {
    require_session(controller).await?;
    print_collections(controller.collections());
    Ok(())
}

pub fn print_collections(collections: &[String]) {
    if collections.is_empty() {
        println!("No collections.");
        return;
    }
    println!("Collections:");
    for name in collections {
        println!("  {name}");
    }
}

async fn upload(controller: &mut Controller, file: &Path, collection: &str) -> Result<()> {
    if let Some(reason) = collection_name_problem(collection) {
        bail!(
            "Invalid collection name '{collection}': {reason}.\n\
             Names must be 3-512 characters, only letters, numbers, dot, underscore or hyphen, \
             starting and ending with a letter or number."
        );
    }

    require_session(controller).await?;

    println!("Uploading {}...", file.display());
    let message = controller
        .upload(file, collection)
        .await
        .context("Error uploading file")?;
    println!("{message}");
    Ok(())
}

async fn ask(controller: &mut Controller, collection: &str, question: &str) -> Result<()> {
    require_session(controller).await?;
    controller
        .select_collection(collection)
        .context("Cannot ask this collection")?;

    let reply = controller.send_question(question).await?;
    println!("{}", reply.content);
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    match collection_name_problem(name) {
        None => {
            println!("'{name}' is a valid collection name.");
            Ok(())
        }
        Some(reason) => {
            println!("'{name}' is not a valid collection name: {reason}.");
            let suggestion = sanitize_collection_name(name);
            if is_valid_collection_name(&suggestion) {
                println!("Suggestion: {suggestion}");
            }
            bail!("Invalid collection name")
        }
    }
}
