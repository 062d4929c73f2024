use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quasar_core::constants::DEFAULT_GRADUATION_YEAR;
use quasar_core::maintenance::{
    DEFAULT_NOTIFICATION_RETENTION_DAYS, MaintenanceConfig, MaintenanceService,
};
use quasar_core::services::{AccountService, SkillService};
use quasar_core::user::Registration;
use quasar_db::{Database, DatabaseConfig};
use quasar_server::auth::Argon2Hasher;

#[derive(Parser)]
#[command(name = "quasar", version, about = "Operator tasks for the Quasar backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Insert the built-in skill catalogue (skips skills that already exist)
    Seed,

    /// Create a verified administrator account
    CreateAdmin {
        #[arg(short, long, env = "QUASAR_ADMIN_EMAIL")]
        email: String,

        /// Read from QUASAR_ADMIN_PASSWORD when not given
        #[arg(short, long, env = "QUASAR_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "Quasar")]
        first_name: String,

        #[arg(long, default_value = "Admin")]
        last_name: String,

        #[arg(long, default_value = "Computer Science")]
        branch: String,

        #[arg(long, default_value_t = DEFAULT_GRADUATION_YEAR)]
        graduation_year: i32,
    },

    /// Expire stale invitations and purge old notifications once
    Sweep {
        /// Notifications older than this many days are deleted
        #[arg(
            long,
            env = "QUASAR_NOTIFICATION_RETENTION_DAYS",
            default_value_t = DEFAULT_NOTIFICATION_RETENTION_DAYS
        )]
        retention_days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quasar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db().await?;

    match cli.command {
        Commands::Migrate => {
            // Migrations already ran in connect_db.
            println!("Database schema is up to date");
        }
        Commands::Seed => {
            let inserted = SkillService::new(db.skills())
                .seed_predefined()
                .await
                .context("Failed to seed predefined skills")?;
            println!("Seeded {inserted} predefined skills");
        }
        Commands::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
            branch,
            graduation_year,
        } => {
            let accounts = AccountService::new(db.users(), Argon2Hasher::default());
            let admin = accounts
                .create_admin(Registration {
                    email,
                    password,
                    first_name,
                    last_name,
                    branch,
                    graduation_year: Some(graduation_year),
                    bio: None,
                })
                .await
                .context("Failed to create admin")?;
            println!("Created admin {} ({})", admin.email, admin.id);
        }
        Commands::Sweep { retention_days } => {
            anyhow::ensure!(retention_days > 0, "--retention-days must be positive");
            let config = MaintenanceConfig {
                notification_retention: TimeDelta::try_days(retention_days)
                    .context("--retention-days is out of range")?,
                ..MaintenanceConfig::default()
            };
            let report = MaintenanceService::new(db.team(), db.notifications(), config)
                .sweep()
                .await
                .context("Maintenance sweep failed")?;
            println!(
                "Expired {} invitations, purged {} notifications",
                report.expired_invitations, report.purged_notifications
            );
        }
    }

    Ok(())
}

/// Connect using DATABASE_URL and bring the schema up to date.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::debug!(max_connections = config.max_connections, "Connected");
    Ok(db)
}
