use clap::Parser;
use medifind::cli::{Cli, Commands};
use medifind::{config, runtime, system};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    config::init_config_from(&cli.config);
    let config = config::get_config();

    match cli.command {
        None | Some(Commands::Serve) => {
            // guard 需存活到进程结束，保证日志落盘
            let _guard = system::init_logging(&config.logging)?;
            runtime::modes::run_server().await
        }
        Some(cmd) => {
            // CLI 模式下只输出告警以上的日志
            let mut logging = config.logging.clone();
            logging.level = "warn".to_string();
            let _guard = system::init_logging(&logging)?;

            if let Err(e) = medifind::interfaces::cli::run_cli_command(cmd).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
