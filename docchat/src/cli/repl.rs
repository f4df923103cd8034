//! Interactive chat loop.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::controller::ControllerError;
use crate::models::{Message, MessageRole};

use super::commands::{print_collections, prompt_password, Controller};

const HELP: &str = "\
Type a question to ask the active collection, or a command:
  /use <NAME>                 Select the collection to ask
  /collections                List collections
  /refresh                    Reload collections from the backend
  /upload <FILE> <NAME>       Upload a PDF into a collection
  /history                    Show this session's messages
  /logout                     Log out
  /help                       Show this help
  /quit                       Exit";

/// A parsed line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Ask(String),
    Use(String),
    Collections,
    Refresh,
    Upload { file: PathBuf, collection: String },
    History,
    Logout,
    Help,
    Quit,
    Invalid(String),
}

/// Parse one input line. Blank lines yield `None`.
fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(ReplCommand::Ask(line.to_string()));
    };

    let (cmd, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(c, a)| (c, a.trim()));

    let command = match (cmd, args) {
        ("use", name) if !name.is_empty() => ReplCommand::Use(name.to_string()),
        ("use", _) => ReplCommand::Invalid("usage: /use <NAME>".to_string()),
        ("collections" | "list", _) => ReplCommand::Collections,
        ("refresh", _) => ReplCommand::Refresh,
        ("upload", args) => match args.rsplit_once(char::is_whitespace) {
            Some((file, collection)) if !file.trim().is_empty() => ReplCommand::Upload {
                file: PathBuf::from(file.trim()),
                collection: collection.to_string(),
            },
            _ => ReplCommand::Invalid("usage: /upload <FILE> <NAME>".to_string()),
        },
        ("history", _) => ReplCommand::History,
        ("logout", _) => ReplCommand::Logout,
        ("help" | "?", _) => ReplCommand::Help,
        ("quit" | "exit" | "q", _) => ReplCommand::Quit,
        (other, _) => ReplCommand::Invalid(format!("unknown command /{other}, try /help")),
    };
    Some(command)
}

fn print_message(message: &Message) {
    let role = match message.role {
        MessageRole::User => "YOU",
        MessageRole::Assistant => "ASSISTANT",
    };
    println!("[{role} {}]:", message.created_at.format("%H:%M:%S"));
    println!("{}", message.content);
    println!();
}

fn prompt(controller: &Controller) -> Result<()> {
    match controller.active_collection() {
        Some(name) => print!("{name}> "),
        None => print!("(select a collection)> "),
    }
    std::io::stdout().flush().context("Failed to flush stdout")
}

/// Select `preferred` if the backend lists it.
fn reselect(controller: &mut Controller, preferred: Option<&str>) {
    if let Some(name) = preferred {
        if let Err(e) = controller.select_collection(name) {
            eprintln!("{e}");
        }
    }
}

/// Ask for credentials until login succeeds. Returns `false` on end of input.
async fn login_interactive(
    controller: &mut Controller,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    loop {
        print!("Username: ");
        std::io::stdout().flush()?;
        let Some(username) = lines.next_line().await? else {
            return Ok(false);
        };
        let username = username.trim().to_string();
        if username.is_empty() {
            continue;
        }
        let password = prompt_password()?;

        match controller.login(&username, &password).await {
            Ok(()) => {
                println!("Logged in as {username}.");
                return Ok(true);
            }
            Err(ControllerError::Gateway(e)) if controller.is_logged_in() => {
                eprintln!("Logged in, but could not list collections: {e}");
                return Ok(true);
            }
            Err(e) => eprintln!("Login failed: {e}"),
        }
    }
}

/// Run the interactive chat until `/quit` or end of input.
pub async fn run_repl(controller: &mut Controller, preferred: Option<&str>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Err(e) = controller.start().await {
        eprintln!("Could not reach backend: {e}");
    }
    reselect(controller, preferred);
    println!("docchat - type /help for commands.");

    loop {
        if let Some(notice) = controller.take_notice() {
            println!("{notice}");
        }

        if !controller.is_logged_in() {
            if !login_interactive(controller, &mut lines).await? {
                return Ok(());
            }
            print_collections(controller.collections());
            reselect(controller, preferred);
            continue;
        }

        prompt(controller)?;
        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };

        let result = match command {
            ReplCommand::Ask(question) => {
                println!("Thinking...");
                controller.send_question(&question).await.map(|reply| {
                    print_message(reply);
                })
            }
            ReplCommand::Use(name) => controller.select_collection(&name),
            ReplCommand::Collections => {
                print_collections(controller.collections());
                Ok(())
            }
            ReplCommand::Refresh => controller
                .refresh_collections()
                .await
                .map(print_collections),
            ReplCommand::Upload { file, collection } => {
                println!("Uploading {}...", file.display());
                controller
                    .upload(&file, &collection)
                    .await
                    .map(|message| println!("{message}"))
            }
            ReplCommand::History => {
                let transcript = controller.transcript();
                if transcript.is_empty() {
                    println!("No messages yet.");
                } else {
                    println!(
                        "{} messages, {} questions:\n",
                        transcript.len(),
                        transcript.count(MessageRole::User)
                    );
                }
                transcript.messages().iter().for_each(print_message);
                Ok(())
            }
            ReplCommand::Logout => controller.logout().map(|()| println!("Logged out.")),
            ReplCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            ReplCommand::Quit => return Ok(()),
            ReplCommand::Invalid(msg) => {
                eprintln!("{msg}");
                Ok(())
            }
        };

        match result {
            Ok(()) | Err(ControllerError::SessionExpired) => {}
            Err(ControllerError::NoActiveCollection) => {
                eprintln!("Select a collection first with /use <NAME>.");
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line("  What is the capital?  "),
            Some(ReplCommand::Ask("What is the capital?".to_string()))
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("/use italy-trip"),
            Some(ReplCommand::Use("italy-trip".to_string()))
        );
        assert_eq!(parse_line("/collections"), Some(ReplCommand::Collections));
        assert_eq!(parse_line("/refresh"), Some(ReplCommand::Refresh));
        assert_eq!(parse_line("/history"), Some(ReplCommand::History));
        assert_eq!(parse_line("/logout"), Some(ReplCommand::Logout));
        assert_eq!(parse_line("/quit"), Some(ReplCommand::Quit));
        assert_eq!(parse_line("/?"), Some(ReplCommand::Help));
    }

    #[test]
    fn test_parse_upload_with_spaces_in_path() {
        assert_eq!(
            parse_line("/upload ~/My Docs/rome guide.pdf rome-guide"),
            Some(ReplCommand::Upload {
                file: PathBuf::from("~/My Docs/rome guide.pdf"),
                collection: "rome-guide".to_string(),
            })
        );
        assert!(matches!(
            parse_line("/upload rome.pdf"),
            Some(ReplCommand::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse_line("/use"), Some(ReplCommand::Invalid(_))));
        assert!(matches!(parse_line("/frobnicate"), Some(ReplCommand::Invalid(_))));
    }
}
