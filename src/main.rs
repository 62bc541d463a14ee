use clap::Parser;
use colored::Colorize;
use hatena_cli::commands::{self, Cli};
use hatena_cli::utils::init_logger;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志系统
    if let Err(err) = init_logger(cli.log_level.as_deref()) {
        eprintln!("{} {:#}", "Invalid log level:".red(), err);
        return ExitCode::from(2);
    }

    match commands::run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{} error: {:?}", err.category().display_name(), err);
            eprintln!("{}", err.user_message().red());
            ExitCode::from(1)
        }
    }
}
