//! User provisioning tool. There is no self-service registration; an
//! operator creates accounts with this binary.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use parlor_server::user::{hash_password, SqliteUserStore, UserStore};

#[derive(Parser, Debug)]
#[command(name = "cli-auth")]
struct CliArgs {
    /// Path to the SQLite users database file.
    pub users_db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new user.
    Add { handle: String, password: String },
    /// List all user handles.
    List,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let store = SqliteUserStore::new(&cli_args.users_db)?;

    match cli_args.command {
        Command::Add { handle, password } => {
            if handle.is_empty() {
                bail!("Handle must not be empty");
            }
            if password.len() < 8 {
                bail!("Password must be at least 8 characters");
            }

            let credentials = hash_password(&password)?;
            let user_id = store.create_user(&handle, &credentials)?;
            println!("Created user '{}' with id {}", handle, user_id);
        }
        Command::List => {
            let handles = store.get_all_user_handles()?;
            if handles.is_empty() {
                println!("No users.");
            } else {
                for handle in handles {
                    println!("{}", handle);
                }
            }
        }
    }

    Ok(())
}
