//! CLI 命令行参数解析
//!
//! 使用 clap 定义命令行接口

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line utility for Hatena Blog.
#[derive(Parser, Debug, Clone)]
#[command(name = "hatena", version, about, long_about = None)]
pub struct Cli {
    /// 日志级别 (error|warn|info|debug|trace)，默认读取 RUST_LOG
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 发布状态 (未指定时交互询问)
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishFlags {
    /// Publish the blog entry
    #[arg(long, conflicts_with = "draft")]
    pub publish: bool,
    /// Keep the blog entry as a draft
    #[arg(long)]
    pub draft: bool,
}

impl PublishFlags {
    /// `Some(true)` publish, `Some(false)` draft, `None` ask.
    pub fn resolve(self) -> Option<bool> {
        flag_pair(self.publish, self.draft)
    }
}

/// 是否同步图片 (未指定时交互询问)
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageFlags {
    /// Upload/delete the images referenced by the entry
    #[arg(long, conflicts_with = "without_images")]
    pub with_images: bool,
    /// Leave images alone
    #[arg(long)]
    pub without_images: bool,
}

impl ImageFlags {
    pub fn resolve(self) -> Option<bool> {
        flag_pair(self.with_images, self.without_images)
    }
}

fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Upload a blog entry to Hatena Blog
    ///
    /// Converts the given Markdown file to HTML and uploads it. Optionally
    /// uploads the images it references to Hatena Fotolife, replacing the
    /// image URLs in the HTML. Relative image paths are looked up next to
    /// the Markdown file first, then in the current directory.
    Upload {
        /// The title of the blog entry
        title: String,
        /// The path of the blog entry (Markdown)
        path: PathBuf,
        #[command(flatten)]
        publish: PublishFlags,
        #[command(flatten)]
        images: ImageFlags,
    },

    /// Update a Hatena Blog entry by id
    ///
    /// Previously uploaded images are found in the entry's published HTML
    /// and deleted from Hatena Fotolife before the new ones are uploaded.
    Update {
        /// The title of the blog entry
        title: String,
        /// The path of the blog entry (Markdown)
        path: PathBuf,
        /// The id of the blog entry
        id: u64,
        #[command(flatten)]
        publish: PublishFlags,
        #[command(flatten)]
        images: ImageFlags,
    },

    /// Delete a Hatena Blog entry by id
    Delete {
        /// The id of the blog entry
        id: u64,
        #[command(flatten)]
        images: ImageFlags,
        /// 跳过确认提示
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Manage the CLI configuration
    #[command(subcommand)]
    Config(ConfigAction),
}

/// 配置管理动作
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Initialise the configuration interactively
    Init,
    /// List the configuration
    List,
    /// Get a configuration value
    Get {
        /// Key such as `blog:username`
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Key such as `blog:username`
        key: String,
        /// New value
        value: String,
    },
    /// Print the configuration file path
    Path,
}
