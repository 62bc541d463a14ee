//! Flat key-value configuration persisted as TOML.
//!
//! Keys are written `section:name` (for example `auth:api_key`). A key that is
//! present neither in the user's file nor in the compiled-in defaults is a
//! configuration error, never a silent default.

use crate::config::{DEFAULT_PANDOC, DEFAULT_TEMPLATE};
use crate::error::{errors, HatenaResult};
use crate::utils::ConfigPaths;
use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fs;
use std::path::Path;
use toml::value::Datetime;
use toml::{Table, Value};
use tracing::{debug, info};

pub const KEY_SEPARATOR: char = ':';

pub const DEFAULT_IMAGE_PATTERN: &str = r#"src="([^"]+\.(?:jpg|jpeg|png|gif))""#;
pub const DEFAULT_IMAGE_REPLACE: &str = r#"src="\1""#;

/// Keys prompted for by `config init`.
pub const INIT_KEYS: [&str; 4] = [
    "auth:api_key",
    "auth:api_secret",
    "blog:username",
    "blog:domain",
];

/// Build the compiled-in defaults for a configuration rooted at `paths`.
pub fn default_table(paths: &ConfigPaths) -> Table {
    let mut auth = Table::new();
    auth.insert("api_key".into(), Value::String(String::new()));
    auth.insert("api_secret".into(), Value::String(String::new()));
    auth.insert("access_token".into(), Value::String(String::new()));
    auth.insert("access_secret".into(), Value::String(String::new()));
    auth.insert("expires".into(), Value::Datetime(epoch_datetime()));

    let mut blog = Table::new();
    blog.insert("username".into(), Value::String(String::new()));
    blog.insert("domain".into(), Value::String(String::new()));

    let mut image = Table::new();
    image.insert("pattern".into(), Value::String(DEFAULT_IMAGE_PATTERN.into()));
    image.insert("replace".into(), Value::String(DEFAULT_IMAGE_REPLACE.into()));

    let mut path = Table::new();
    path.insert(
        "template".into(),
        Value::String(paths.template_file.to_string_lossy().into_owned()),
    );
    path.insert("pandoc".into(), Value::String(DEFAULT_PANDOC.into()));

    let mut root = Table::new();
    root.insert("auth".into(), Value::Table(auth));
    root.insert("blog".into(), Value::Table(blog));
    root.insert("image".into(), Value::Table(image));
    root.insert("path".into(), Value::Table(path));
    root
}

fn epoch_datetime() -> Datetime {
    to_toml_datetime(DateTime::<Utc>::UNIX_EPOCH)
}

/// Convert a UTC timestamp into a TOML offset datetime.
pub fn to_toml_datetime(value: DateTime<Utc>) -> Datetime {
    Datetime {
        date: Some(toml::value::Date {
            year: value.year() as u16,
            month: value.month() as u8,
            day: value.day() as u8,
        }),
        time: Some(toml::value::Time {
            hour: value.hour() as u8,
            minute: value.minute() as u8,
            second: value.second() as u8,
            nanosecond: 0,
        }),
        offset: Some(toml::value::Offset::Z),
    }
}

/// Configuration loaded once per process and passed to the components that need it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: ConfigPaths,
    values: Table,
    defaults: Table,
}

impl ConfigStore {
    /// Initialise missing files and load the configuration.
    pub fn open(paths: ConfigPaths) -> HatenaResult<Self> {
        Self::ensure_initialized(&paths)?;
        Self::load(paths)
    }

    /// Create the config directory, config file and template file when absent.
    ///
    /// Existing files are left untouched.
    pub fn ensure_initialized(paths: &ConfigPaths) -> HatenaResult<()> {
        if !paths.config_dir.exists() {
            fs::create_dir_all(&paths.config_dir).map_err(|err| {
                errors::filesystem_error(
                    "Failed to create config directory",
                    paths.config_dir.display().to_string(),
                    err,
                )
            })?;
            info!("Created config directory {}", paths.config_dir.display());
        }

        if !paths.config_file.exists() {
            let content = toml::to_string_pretty(&default_table(paths))?;
            write_atomically(&paths.config_file, &content)?;
            info!("Wrote default config to {}", paths.config_file.display());
        }

        if !paths.template_file.exists() {
            write_atomically(&paths.template_file, DEFAULT_TEMPLATE)?;
            info!("Wrote default template to {}", paths.template_file.display());
        }

        Ok(())
    }

    /// Load the configuration file without creating anything.
    pub fn load(paths: ConfigPaths) -> HatenaResult<Self> {
        let content = fs::read_to_string(&paths.config_file).map_err(|err| {
            errors::filesystem_error(
                "Failed to read config file",
                paths.config_file.display().to_string(),
                err,
            )
        })?;
        let values: Table = toml::from_str(&content)?;
        debug!("Loaded config from {}", paths.config_file.display());

        Ok(Self {
            defaults: default_table(&paths),
            paths,
            values,
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Look up a key in the user file, falling back to the defaults.
    pub fn get(&self, key: &str) -> HatenaResult<Value> {
        let (section, name) = split_key(key)?;
        lookup(&self.values, section, name)
            .or_else(|| lookup(&self.defaults, section, name))
            .cloned()
            .ok_or_else(|| errors::missing_key(key))
    }

    pub fn get_str(&self, key: &str) -> HatenaResult<String> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch(key, "a string", &other)),
        }
    }

    pub fn get_datetime(&self, key: &str) -> HatenaResult<DateTime<Utc>> {
        let value = self.get(key)?;
        let raw = match &value {
            Value::Datetime(dt) => dt.to_string(),
            Value::String(s) => s.clone(),
            other => return Err(type_mismatch(key, "a datetime", other)),
        };
        parse_timestamp(&raw).ok_or_else(|| type_mismatch(key, "a datetime", &value))
    }

    /// Set a key in memory. Call [`ConfigStore::save`] to persist.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> HatenaResult<()> {
        let (section, name) = split_key(key)?;
        let value = value.into();

        let entry = self
            .values
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        let table = match entry {
            Value::Table(inner) => inner,
            _ => {
                return Err(errors::validation_error(
                    format!("'{}' is not a section", section),
                    Some(key.to_string()),
                    None,
                ))
            }
        };
        if matches!(table.get(name), Some(Value::Table(_))) && !value.is_table() {
            return Err(errors::validation_error(
                format!("'{}' is a section and cannot hold a single value", key),
                Some(key.to_string()),
                None,
            ));
        }
        table.insert(name.to_string(), value);
        Ok(())
    }

    /// Set a key from command-line text, coercing it to the type of the
    /// existing value (booleans, datetimes and integers stay typed).
    pub fn set_from_str(&mut self, key: &str, raw: &str) -> HatenaResult<()> {
        let value = match self.get(key).ok() {
            Some(Value::Boolean(_)) => Value::Boolean(parse_bool(raw).ok_or_else(|| {
                errors::validation_error(
                    "expected true or false",
                    Some(key.to_string()),
                    Some(raw.to_string()),
                )
            })?),
            Some(Value::Datetime(_)) => Value::Datetime(raw.parse().map_err(|_| {
                errors::validation_error(
                    "expected an RFC 3339 datetime",
                    Some(key.to_string()),
                    Some(raw.to_string()),
                )
            })?),
            Some(Value::Integer(_)) => Value::Integer(raw.parse().map_err(|_| {
                errors::validation_error(
                    "expected an integer",
                    Some(key.to_string()),
                    Some(raw.to_string()),
                )
            })?),
            _ => Value::String(raw.to_string()),
        };
        self.set(key, value)
    }

    /// Serialize the whole store back to the config file.
    pub fn save(&self) -> HatenaResult<()> {
        let content = toml::to_string_pretty(&self.values)?;
        write_atomically(&self.paths.config_file, &content)?;
        debug!("Saved config to {}", self.paths.config_file.display());
        Ok(())
    }

    /// Every key visible through [`ConfigStore::get`], sorted by key.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut merged = Vec::new();
        flatten(&self.defaults, "", &mut merged);
        let mut user = Vec::new();
        flatten(&self.values, "", &mut user);

        for (key, value) in user {
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }
        merged.sort_by(|a, b| a.0.cmp(&b.0));
        merged
    }
}

/// Render a value for terminal output (strings without quotes).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse either an RFC 3339 timestamp or a local datetime without offset.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Exactly `section:name`, both parts non-empty.
fn split_key(key: &str) -> HatenaResult<(&str, &str)> {
    match key.split_once(KEY_SEPARATOR) {
        Some((section, name))
            if !section.is_empty() && !name.is_empty() && !name.contains(KEY_SEPARATOR) =>
        {
            Ok((section, name))
        }
        _ => Err(invalid_key(key)),
    }
}

fn invalid_key(key: &str) -> crate::error::HatenaError {
    errors::validation_error(
        "config keys look like section:name",
        Some("key".to_string()),
        Some(key.to_string()),
    )
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> crate::error::HatenaError {
    errors::config_error(format!(
        "{} must be {}, found {}",
        key,
        expected,
        found.type_str()
    ))
}

fn lookup<'a>(table: &'a Table, section: &str, name: &str) -> Option<&'a Value> {
    match table.get(section)? {
        Value::Table(inner) => inner.get(name),
        _ => None,
    }
}

fn flatten(table: &Table, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}{}{}", prefix, KEY_SEPARATOR, name)
        };
        match value {
            Value::Table(inner) => flatten(inner, &key, out),
            other => out.push((key, other.clone())),
        }
    }
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_atomically(path: &Path, content: &str) -> HatenaResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(|err| {
        errors::filesystem_error("Failed to write file", tmp.display().to_string(), err)
    })?;
    fs::rename(&tmp, path).map_err(|err| {
        errors::filesystem_error("Failed to replace file", path.display().to_string(), err)
    })
}
