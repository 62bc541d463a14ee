//! upload / update / delete 命令实现

use crate::api::{BlogClient, FotolifeClient};
use crate::auth::{AuthState, CredentialManager, Credentials, OAuthClient};
use crate::cli_oauth::BrowserVerifierPrompt;
use crate::config_store::ConfigStore;
use crate::convert::PandocConverter;
use crate::error::{errors, HatenaResult};
use crate::images::{DeleteReport, ImageSync};
use crate::progress::ProgressMode;
use crate::publisher::{EntryPublisher, PublishRequest};
use chrono::Utc;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::PathBuf;

pub const KEY_BLOG_USERNAME: &str = "blog:username";
pub const KEY_BLOG_DOMAIN: &str = "blog:domain";
pub const KEY_PANDOC: &str = "path:pandoc";
pub const KEY_TEMPLATE: &str = "path:template";

/// Clients and helpers built from the configuration.
struct Services {
    converter: PandocConverter,
    blog: BlogClient,
    host: FotolifeClient,
    images: ImageSync,
    progress: ProgressMode,
}

impl Services {
    fn from_config(store: &ConfigStore) -> HatenaResult<Self> {
        let username = required(store, KEY_BLOG_USERNAME)?;
        let domain = required(store, KEY_BLOG_DOMAIN)?;
        let progress = terminal_progress();

        Ok(Self {
            converter: PandocConverter::new(
                store.get_str(KEY_PANDOC)?,
                store.get_str(KEY_TEMPLATE)?,
            ),
            blog: BlogClient::new(username, domain),
            host: FotolifeClient::new(),
            images: ImageSync::from_config(store)?.with_progress(progress),
            progress,
        })
    }

    fn publisher(&self) -> EntryPublisher<'_> {
        EntryPublisher::new(&self.converter, &self.blog, &self.host, &self.images)
            .with_progress(self.progress)
    }
}

fn required(store: &ConfigStore, key: &str) -> HatenaResult<String> {
    let value = store.get_str(key)?;
    if value.trim().is_empty() {
        return Err(errors::empty_value(key));
    }
    Ok(value)
}

/// 仅在交互终端上绘制进度
fn terminal_progress() -> ProgressMode {
    if console::Term::stderr().is_term() {
        ProgressMode::Terminal
    } else {
        ProgressMode::Hidden
    }
}

async fn credentials(store: &mut ConfigStore) -> HatenaResult<Credentials> {
    let manager = CredentialManager::new(OAuthClient::new(BrowserVerifierPrompt::new()));
    if manager.state(store, Utc::now())? == AuthState::Unauthenticated {
        println!("{}", "Access token missing or expired, authorizing with Hatena...".yellow());
    }
    manager.ensure_valid(store).await
}

fn ask(flag: Option<bool>, prompt: &str) -> HatenaResult<bool> {
    match flag {
        Some(value) => Ok(value),
        None => Ok(Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?),
    }
}

pub async fn upload(
    store: &mut ConfigStore,
    title: String,
    document: PathBuf,
    publish: Option<bool>,
    with_images: Option<bool>,
) -> HatenaResult<()> {
    let request = PublishRequest {
        publish: ask(publish, "Publish draft?")?,
        with_images: ask(with_images, "Upload images?")?,
        title,
        document,
    };
    let services = Services::from_config(store)?;
    let credentials = credentials(store).await?;

    let entry_id = services.publisher().create(&request, &credentials).await?;

    let state = if request.publish { "Published" } else { "Uploaded draft" };
    match entry_id {
        Some(id) => println!(
            "{} {} '{}' (entry id {})",
            "✅".green(),
            state,
            request.title.cyan(),
            id.to_string().yellow()
        ),
        None => println!("{} {} '{}'", "✅".green(), state, request.title.cyan()),
    }
    Ok(())
}

pub async fn update(
    store: &mut ConfigStore,
    entry_id: u64,
    title: String,
    document: PathBuf,
    publish: Option<bool>,
    with_images: Option<bool>,
) -> HatenaResult<()> {
    let request = PublishRequest {
        publish: ask(publish, "Publish draft?")?,
        with_images: ask(with_images, "Upload images?")?,
        title,
        document,
    };
    let services = Services::from_config(store)?;
    let credentials = credentials(store).await?;

    let report = services
        .publisher()
        .update(entry_id, &request, &credentials)
        .await?;

    println!(
        "{} Updated entry {} '{}'",
        "✅".green(),
        entry_id.to_string().yellow(),
        request.title.cyan()
    );
    print_skipped(&report);
    Ok(())
}

pub async fn delete(
    store: &mut ConfigStore,
    entry_id: u64,
    with_images: Option<bool>,
    yes: bool,
) -> HatenaResult<()> {
    let with_images = ask(with_images, "Delete images?")?;

    println!("This command will delete blog entry {}.", entry_id.to_string().yellow());
    let confirmed = if yes {
        true
    } else {
        Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()?
    };
    if !confirmed {
        return Err(errors::aborted("Deletion cancelled"));
    }

    let services = Services::from_config(store)?;
    let credentials = credentials(store).await?;

    let report = services
        .publisher()
        .delete(entry_id, with_images, &credentials)
        .await?;

    println!("{} Deleted entry {}", "✅".green(), entry_id.to_string().yellow());
    print_skipped(&report);
    Ok(())
}

fn skipped_lines(report: &DeleteReport) -> Vec<String> {
    if report.skipped.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "{} image(s) left on Fotolife, no image id in:",
        report.skipped.len()
    )];
    lines.extend(report.skipped.iter().map(|reference| format!("  {}", reference)));
    lines
}

fn print_skipped(report: &DeleteReport) {
    for line in skipped_lines(report) {
        println!("{}", line.yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::utils::ConfigPaths;
    use tempfile::TempDir;

    #[test]
    fn empty_blog_settings_are_reported_as_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(ConfigPaths::in_dir(dir.path())).unwrap();

        let err = Services::from_config(&store).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Config);
        let message = err.user_message();
        assert!(message.contains("blog:username"));
        assert!(message.contains("empty"));
        assert!(!message.contains("not found"));

        store.set(KEY_BLOG_USERNAME, "someone").unwrap();
        store.set(KEY_BLOG_DOMAIN, "someone.hatenablog.com").unwrap();
        assert!(Services::from_config(&store).is_ok());
    }

    #[test]
    fn explicit_flags_skip_the_prompt() {
        assert!(ask(Some(true), "unused").unwrap());
        assert!(!ask(Some(false), "unused").unwrap());
    }

    #[test]
    fn skipped_images_are_listed() {
        assert!(skipped_lines(&DeleteReport::default()).is_empty());

        let report = DeleteReport {
            deleted: 2,
            skipped: vec!["https://cdn.example/fotolife/".to_string()],
        };
        assert_eq!(
            skipped_lines(&report),
            vec![
                "1 image(s) left on Fotolife, no image id in:".to_string(),
                "  https://cdn.example/fotolife/".to_string(),
            ]
        );
    }
}
