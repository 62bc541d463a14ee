//! config 子命令实现

use super::parser::ConfigAction;
use crate::config_store::{display_value, ConfigStore, INIT_KEYS};
use crate::error::HatenaResult;
use colored::Colorize;
use dialoguer::Input;

pub fn execute(store: &mut ConfigStore, action: ConfigAction) -> HatenaResult<()> {
    match action {
        ConfigAction::Init => init(store),
        ConfigAction::List => {
            println!("List of config:");
            for line in list_lines(store) {
                println!("{}", line);
            }
            Ok(())
        }
        ConfigAction::Get { key } => {
            println!("{}", get_line(store, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            set(store, &key, &value)?;
            println!("{}", get_line(store, &key)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", store.paths().config_file.display());
            Ok(())
        }
    }
}

fn init(store: &mut ConfigStore) -> HatenaResult<()> {
    for key in INIT_KEYS {
        let current = store.get_str(key).unwrap_or_default();
        let value: String = Input::new()
            .with_prompt(key)
            .with_initial_text(current)
            .interact_text()?;
        set(store, key, value.trim())?;
    }
    println!(
        "{} Configuration saved to {}",
        "✅".green(),
        store.paths().config_file.display().to_string().cyan()
    );
    Ok(())
}

/// Set and persist immediately.
pub fn set(store: &mut ConfigStore, key: &str, value: &str) -> HatenaResult<()> {
    store.set_from_str(key, value)?;
    store.save()
}

pub fn get_line(store: &ConfigStore, key: &str) -> HatenaResult<String> {
    Ok(format!("{}: {}", key, display_value(&store.get(key)?)))
}

pub fn list_lines(store: &ConfigStore) -> Vec<String> {
    store
        .entries()
        .iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect()
}
