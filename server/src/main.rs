//! Control Interface Server Entry Point

use anyhow::Context;
use clap::Parser;
use control_interface::auth::bootstrap::create_admin;
use control_interface::cli::{Cli, Command};
use control_interface::db::migrations::initialize_database;
use control_interface::{logging, server};
use control_interface_common::config::ControlConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let config =
        ControlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command() {
        Command::Serve => server::run(config).await.context("Server error")?,
        Command::CreateAdmin {
            username,
            password,
            email,
        } => {
            let pool = initialize_database(&config.database_url)
                .await
                .context("Failed to initialize database")?;
            let user = create_admin(&pool, &username, &email, &password)
                .await
                .context("Failed to create admin user")?;
            println!("Created admin user: {}", user.username);
        }
    }

    Ok(())
}
