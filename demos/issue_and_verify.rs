//! Issue an OpenToken and verify it
//!
//! Reads the context from `OPENTOKEN_*` environment variables, issues a token
//! for the subject given on the command line, then decodes it again and shows
//! what a relying party sees, including a tampered and an expired variant.
//!
//! Usage:
//! ```bash
//! export OPENTOKEN_PASSWORD="Password1"
//! export OPENTOKEN_CIPHER="aes-256-cbc"
//! RUST_LOG=opentoken=debug cargo run --example issue_and_verify -- john@example.com
//! ```

use chrono::{Duration, Utc};
use opentoken::{AttributeMap, OpenTokenError, ReservedAttribute, TokenConfig};
use std::env;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let subject = env::args()
        .nth(1)
        .unwrap_or_else(|| "john@example.com".to_string());

    let mut config = TokenConfig::from_env()?;
    if config.password.is_empty() {
        config.password = "Password1".to_string();
    }
    let ctx = config.build()?;

    println!("=== OpenToken ===");
    println!("Cipher:     {}", ctx.cipher());
    println!("Clock skew: {}s", ctx.clock_skew().num_seconds());
    println!();

    // Step 1: Issue
    let mut attributes = AttributeMap::new();
    attributes.insert(ReservedAttribute::Subject.key().to_string(), subject);
    attributes.insert("last_name".to_string(), "D'angelo".to_string());

    let now = Utc::now();
    let text = ctx.issue(&attributes, now)?;
    println!("1. Issued token ({} chars):", text.len());
    println!("   {}", text);
    println!();

    // Step 2: Verify
    let token = ctx.decode(&text)?;
    println!("2. Verified attributes:");
    for (key, value) in token.iter() {
        println!("   {:<16} {}", key, value);
    }
    println!();

    // Step 3: Tamper
    let mut tampered = text.clone().into_bytes();
    let middle = tampered.len() / 2;
    tampered[middle] = if tampered[middle] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered)?;
    match ctx.decode(&tampered) {
        Err(err) if err.is_invalid() => println!("3. Tampered token rejected: {}", err),
        other => println!("3. Unexpected result for tampered token: {:?}", other),
    }

    // Step 4: Expiry
    let later = ctx
        .lifetime()
        .lifetime
        .checked_add(&Duration::minutes(1))
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or("configured lifetime out of range")?;
    match ctx.decode_at(&text, later) {
        Err(OpenTokenError::TokenExpired(expired)) => {
            println!("4. Token expired at {}", later);
            println!(
                "   Renewable: {}",
                expired.token().is_renewable_at(later)
            );
        }
        other => println!("4. Unexpected result for expired token: {:?}", other),
    }

    Ok(())
}
