// CLI layer: clap command tree, dialoguer prompting for omitted values, and
// the dispatch from a parsed command to a single API call plus its output.
// Each invocation runs exactly one command and exits.

use crate::api::{plain, ApiClient, ServerReply};
use crate::token::TokenStore;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "chirp", version, about = "Command-line client for the Chirp social API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// One subcommand per remote operation. Names render in snake_case to match
/// the backend's verbs (`get_users`, `create_post`, ...).
#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
pub enum Command {
    /// Register a new user
    Register {
        /// The name of the user
        #[arg(long)]
        name: Option<String>,
        /// The password of the user
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and store the session token
    Login {
        /// The name of the user
        #[arg(long)]
        name: Option<String>,
        /// The password of the user
        #[arg(long)]
        password: Option<String>,
    },
    /// List all users
    GetUsers {
        /// The JWT token of the user
        #[arg(long)]
        token: Option<String>,
    },
    /// Create a new post
    CreatePost {
        /// The JWT token of the user
        #[arg(long)]
        token: Option<String>,
        /// The content of the post
        #[arg(long)]
        content: Option<String>,
    },
    /// Like a post
    LikePost {
        /// The JWT token of the user
        #[arg(long)]
        token: Option<String>,
        /// The ID of the post to like
        #[arg(long)]
        id: Option<String>,
    },
    /// Read your notifications
    ReadNotifications {
        /// The JWT token of the user
        #[arg(long)]
        token: Option<String>,
    },
    /// Update a user's name and/or avatar
    UpdateUser {
        /// The JWT token of the user
        #[arg(long)]
        token: Option<String>,
        /// The ID of the user to update
        #[arg(long = "user_id")]
        user_id: Option<String>,
        /// The new name of the user
        #[arg(long)]
        name: Option<String>,
        /// The path to the new avatar image
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
}

impl Cli {
    /// Run the parsed command against the given client and token store.
    pub fn run(self, api: &ApiClient, store: &TokenStore) -> Result<()> {
        match self.command {
            Command::Register { name, password } => {
                let name = text_or_prompt(name, "Name")?;
                let password = password_or_prompt(password)?;
                let spin = spinner("Registering...");
                let reply = api.register(&name, &password);
                spin.finish_and_clear();
                match reply? {
                    Ok(()) => println!("User registered successfully"),
                    Err(err) => println!("Failed to register user: {err}"),
                }
            }
            Command::Login { name, password } => {
                let name = text_or_prompt(name, "Name")?;
                let password = password_or_prompt(password)?;
                let spin = spinner("Logging in...");
                let reply = api.login(&name, &password);
                spin.finish_and_clear();
                match reply? {
                    Ok(token) => {
                        store.set_token(&token)?;
                        println!("Logged in successfully, token: {token}");
                    }
                    Err(err) => println!("Failed to login: {err}"),
                }
            }
            Command::GetUsers { token } => {
                let Some(token) = resolve_token(token, store)? else {
                    return no_token();
                };
                let spin = spinner("Fetching users...");
                let reply = api.get_users(&token);
                spin.finish_and_clear();
                match reply? {
                    Ok(users) => {
                        for user in users {
                            println!("User ID: {}, Name: {}", plain(&user.id), user.name);
                        }
                    }
                    Err(err) => println!("Failed to fetch users: {err}"),
                }
            }
            Command::CreatePost { token, content } => {
                let content = text_or_prompt(content, "Content")?;
                let Some(token) = resolve_token(token, store)? else {
                    return no_token();
                };
                let spin = spinner("Creating post...");
                let reply = api.create_post(&token, &content);
                spin.finish_and_clear();
                match reply? {
                    Ok(()) => println!("Post created successfully"),
                    Err(err) => println!("Failed to create post: {err}"),
                }
            }
            Command::LikePost { token, id } => {
                let id = text_or_prompt(id, "Id")?;
                let Some(token) = resolve_token(token, store)? else {
                    return no_token();
                };
                let spin = spinner("Liking post...");
                let reply = api.like_post(&token, &id);
                spin.finish_and_clear();
                match reply? {
                    Ok(()) => println!("Post liked successfully"),
                    Err(err) => println!("Failed to like post: {err}"),
                }
            }
            Command::ReadNotifications { token } => {
                let Some(token) = resolve_token(token, store)? else {
                    return no_token();
                };
                let spin = spinner("Fetching notifications...");
                let reply = api.read_notifications(&token);
                spin.finish_and_clear();
                match reply? {
                    Ok(notifications) => {
                        for n in notifications {
                            println!(
                                "Notification ID: {}, Type: {}, Post ID: {}, Liked By: {}",
                                plain(&n.id),
                                plain(&n.kind),
                                plain(&n.post_id),
                                plain(&n.liked_by),
                            );
                        }
                    }
                    Err(err) => println!("Failed to fetch notifications: {err}"),
                }
            }
            Command::UpdateUser {
                token,
                user_id,
                name,
                avatar,
            } => {
                // Validate the avatar path up front, before any prompt or
                // network traffic.
                if let Some(path) = &avatar {
                    if !path.exists() {
                        bail!("Path '{}' does not exist", path.display());
                    }
                }
                let user_id = text_or_prompt(user_id, "User id")?;
                let Some(token) = resolve_token(token, store)? else {
                    return no_token();
                };
                let spin = spinner("Updating user...");
                let reply = api.update_user(&token, &user_id, name.as_deref(), avatar.as_deref());
                spin.finish_and_clear();
                match reply? {
                    Ok(()) => println!("User updated successfully"),
                    Err(err) => println!("Failed to update user: {err}"),
                }
            }
        }
        Ok(())
    }
}

/// Resolve the session token: an explicit `--token` wins over the stored
/// one. `None` means the caller must ask the user to log in.
fn resolve_token(explicit: Option<String>, store: &TokenStore) -> Result<Option<String>> {
    match explicit {
        Some(token) => Ok(Some(token)),
        None => store.get_token(),
    }
}

/// No resolvable token: report locally and exit without touching the
/// network.
fn no_token() -> Result<()> {
    println!("No token provided or found. Please login first.");
    Ok(())
}

/// Use the flag value if given, otherwise prompt for it interactively.
fn text_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Like `text_or_prompt`, but with terminal echo suppressed.
fn password_or_prompt(value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Password::new().with_prompt("Password").interact()?),
    }
}

/// Spinner shown while the request is in flight. Draws nothing when stdout
/// is not a terminal.
fn spinner(msg: &'static str) -> ProgressBar {
    let spin = ProgressBar::new_spinner();
    spin.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spin.set_message(msg);
    spin.enable_steady_tick(Duration::from_millis(100));
    spin
}
