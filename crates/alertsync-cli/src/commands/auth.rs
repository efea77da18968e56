use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::auth::{self, KeySource, StoredCredentials};
use crate::output::{print_error, print_success};

pub fn login(dir: &Path, api_key: Option<&str>, profile: &str) -> Result<()> {
    let api_key = api_key
        .filter(|k| !k.is_empty())
        .context("--api-key is required")?;
    auth::save_credentials(
        dir,
        profile,
        &StoredCredentials {
            api_key: api_key.to_string(),
        },
    )?;
    print_success(&format!(
        "Saved API key {} for profile {}",
        auth::mask_key(api_key).cyan(),
        profile.cyan()
    ));
    Ok(())
}

pub fn logout(dir: &Path, profile: &str) -> Result<()> {
    if auth::remove_credentials(dir, profile)? {
        print_success("Logged out (credentials removed)");
    } else {
        println!("No credentials found for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(dir: &Path, api_key: Option<&str>, profile: &str) -> Result<()> {
    println!("{}: {}", "Profile".cyan(), profile);
    match auth::resolve_api_key(api_key, dir, profile) {
        Ok((key, source)) => {
            let source = match source {
                KeySource::Flag => "--api-key / NR_API_KEY",
                KeySource::Stored => "stored credentials",
            };
            println!("{}: {} ({source})", "API key".cyan(), auth::mask_key(&key));
        }
        Err(_) => print_error(&format!("Not logged in (profile: \"{profile}\")")),
    }
    Ok(())
}
