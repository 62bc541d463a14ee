//! CLI 命令处理模块
//!
//! 解析后的命令在这里分发到各个实现

pub mod config;
pub mod entry;
pub mod parser;

pub use parser::{Cli, Commands, ConfigAction, ImageFlags, PublishFlags};

use crate::config_store::ConfigStore;
use crate::error::HatenaResult;
use crate::utils::ConfigPaths;

/// Load the configuration once and run the command against it.
pub async fn run(command: Commands) -> HatenaResult<()> {
    let mut store = ConfigStore::open(ConfigPaths::new()?)?;

    match command {
        Commands::Upload {
            title,
            path,
            publish,
            images,
        } => entry::upload(&mut store, title, path, publish.resolve(), images.resolve()).await,
        Commands::Update {
            title,
            path,
            id,
            publish,
            images,
        } => {
            entry::update(
                &mut store,
                id,
                title,
                path,
                publish.resolve(),
                images.resolve(),
            )
            .await
        }
        Commands::Delete { id, images, yes } => {
            entry::delete(&mut store, id, images.resolve(), yes).await
        }
        Commands::Config(action) => config::execute(&mut store, action),
    }
}
