//! A CLI tool for creating a user without going through the HTTP API,
//! e.g. to bootstrap the first user on a fresh database.

use clap::Parser;
use rusqlite::Connection;

use fintrack_rs::{PasswordHash, create_user, initialize_db};

/// Create a user in the application database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address the new user will log in with.
    #[arg(long)]
    email: String,
}

fn main() {
    let args = Args::parse();

    let password = rpassword::prompt_password("New password: ")
        .expect("Could not read password from stdin.");
    let confirmed = rpassword::prompt_password("Confirm password: ")
        .expect("Could not read password from stdin.");

    if password != confirmed {
        eprintln!("Passwords do not match.");
        std::process::exit(1);
    }

    let password_hash = match PasswordHash::from_raw_password(&password, PasswordHash::DEFAULT_COST)
    {
        Ok(hash) => hash,
        Err(error) => {
            eprintln!("Invalid password: {error}");
            std::process::exit(1);
        }
    };

    let connection =
        Connection::open(&args.db_path).expect("Could not open the application database.");
    initialize_db(&connection).expect("Could not initialize the application database.");

    match create_user(&connection, &args.email, password_hash) {
        Ok(user) => println!("Created user {} ({})", user.id, user.email),
        Err(error) => {
            eprintln!("Could not create user: {error}");
            std::process::exit(1);
        }
    }
}
