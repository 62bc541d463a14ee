//! CLI OAuth Authorization Handler Module
//!
//! Opens the authorization page in a browser and asks the user to paste the
//! verifier code shown by Hatena after granting access.

use crate::auth::VerifierPrompt;
use crate::error::HatenaResult;
use crate::progress;
use colored::Colorize;
use dialoguer::Input;
use tracing::warn;

/// Interactive verifier prompt backed by the system browser and the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserVerifierPrompt;

impl BrowserVerifierPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl VerifierPrompt for BrowserVerifierPrompt {
    fn verifier(&self, authorize_url: &str) -> HatenaResult<String> {
        let spinner = progress::spinner("Launching web browser for user authentication...");
        let launched = open::that(authorize_url);
        spinner.finish_and_clear();

        if let Err(err) = launched {
            warn!("Failed to open browser: {}", err);
            println!("{}", "Could not open a browser automatically.".yellow());
        }

        println!();
        println!("🔗 Authorize access at:");
        println!("{}", authorize_url.cyan());
        println!();

        let code: String = Input::new().with_prompt("Enter code").interact_text()?;
        Ok(code)
    }
}
