//! Compile-time constants shared across modules

pub const APP_DIR_NAME: &str = "hatena-cli";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const TEMPLATE_FILE_NAME: &str = "template.html";
pub const DEFAULT_TEMPLATE: &str = "$body$";
pub const DEFAULT_PANDOC: &str = "pandoc";

/// Overrides the configuration directory (used by tests and portable setups).
pub const CONFIG_DIR_ENV: &str = "HATENA_CLI_CONFIG_DIR";

pub const HATENA_BLOG_URL: &str = "https://blog.hatena.ne.jp";
pub const HATENA_FOTOLIFE_URL: &str = "https://f.hatena.ne.jp";

pub const OAUTH_INITIATE_URL: &str = "https://www.hatena.com/oauth/initiate";
pub const OAUTH_AUTHORIZE_URL: &str = "https://www.hatena.ne.jp/oauth/authorize";
pub const OAUTH_ACCESS_TOKEN_URL: &str = "https://www.hatena.com/oauth/token";
pub const OAUTH_SCOPES: [&str; 4] = [
    "read_public",
    "write_public",
    "read_private",
    "write_private",
];

/// Lifetime given to a freshly obtained access token.
pub const ACCESS_TOKEN_LIFETIME_DAYS: i64 = 60;

/// Maximum length Fotolife accepts for `<dc:subject>`.
pub const FOTOLIFE_SUBJECT_MAX_CHARS: usize = 24;
