//! Operator utility commands.
//!
//! `sf-ops token` mints a session token for a phone number without an SMS
//! round trip, `sf-ops inspect` decodes one, and `sf-ops normalize` shows how
//! a raw phone number canonicalizes.

#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use sf_auth::{Claims, SessionKeys};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint a session token for an already-verified phone number.
    Token {
        /// Phone number, any format `normalize` accepts.
        phone: String,
        /// Session secret the service signs with.
        #[arg(long)]
        secret: String,
        /// Token lifetime in seconds.
        #[arg(long, default_value_t = 86_400)]
        ttl: u64,
    },
    /// Verify a session token and print its claims.
    Inspect {
        token: String,
        #[arg(long)]
        secret: String,
    },
    /// Normalize a phone number to E.164.
    Normalize { phone: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Token { phone, secret, ttl } => {
            let phone = sf_phone::normalize(&phone)?;
            let keys = SessionKeys::new(&secret);
            let claims = Claims::new(phone.as_str(), Duration::from_secs(ttl));
            println!("{}", keys.sign(&claims)?);
        }
        Command::Inspect { token, secret } => {
            let keys = SessionKeys::new(&secret);
            match keys.verify(&token) {
                Some(claims) => println!("{}", serde_json::to_string_pretty(&claims)?),
                None => anyhow::bail!("token is invalid or expired"),
            }
        }
        Command::Normalize { phone } => {
            println!("{}", sf_phone::normalize(&phone)?);
        }
    }
    Ok(())
}
