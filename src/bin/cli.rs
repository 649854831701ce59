//! SportsOrg CLI - Main entry point for CLI binary
//!
//! This binary provides the `sportsorg-cli` tool for accounts and records.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing_subscriber::{prelude::*, EnvFilter};

use sportsorg_lib::engine::{
    self,
    cli::{field_values, formatter::CliFormatter, Cli, Commands, Credentials, MigrateAction, OutputFormat},
    config::{Config, CONFIG_FILE},
    database::Database,
    migrations::MigrationRunner,
    AuthService, DeleteOutcome, EntityKind, FormState, ProfileFields, Session,
};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        CliFormatter::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let config_dir = cli.get_config_dir();
    let config = Config::load_or_default(&config_dir)
        .with_context(|| format!("loading {}", config_dir.join(CONFIG_FILE).display()))?;
    init_tracing(&config.logging.level);

    let json = cli.format == OutputFormat::Json;
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path(&config_dir));

    let open = || {
        engine::open_database(&db_path, config.database.auto_migrate)
            .with_context(|| format!("opening database {}", db_path.display()))
    };

    match cli.command {
        Commands::Init { name, force } => cmd_init(&config_dir, name, force, cli.db.as_deref(), json),
        Commands::Migrate { action } => cmd_migrate(action, &db_path, json),
        Commands::Register {
            credentials,
            role,
            first_name,
            last_name,
        } => {
            let profile = ProfileFields::new(&first_name, &last_name);
            cmd_register(&open()?, &credentials, &role, &profile, json)
        }
        Commands::Login { credentials } => cmd_login(&open()?, &credentials, json),
        Commands::List { entity, credentials } => cmd_list(&open()?, &credentials, entity, json),
        Commands::Add {
            entity,
            set,
            credentials,
        } => cmd_submit(&open()?, &credentials, entity, FormState::Idle, set, json),
        Commands::Edit {
            entity,
            id,
            set,
            credentials,
        } => cmd_submit(&open()?, &credentials, entity, FormState::Editing(id), set, json),
        Commands::Delete {
            entity,
            id,
            yes,
            credentials,
        } => cmd_delete(&open()?, &credentials, entity, id, yes, json),
    }
}

fn cmd_init(config_dir: &Path, name: Option<String>, force: bool, db: Option<&Path>, json: bool) -> Result<()> {
    let config_path = config_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        bail!("Config already exists: {} (use --force to overwrite)", config_path.display());
    }

    let mut config = Config::default_config();
    if let Some(name) = name {
        config.organization.name = name;
    }
    if let Some(db) = db {
        config.database.path = db.to_path_buf();
    }
    config.save(config_dir)?;

    let db_path = config.database_path(config_dir);
    let db = Database::open(&db_path)?;
    let applied = MigrationRunner::new().push(&db)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "config": config_path.display().to_string(),
                "database": db_path.display().to_string(),
                "applied": applied,
            })
        );
    } else {
        CliFormatter::success(&format!("Initialized {}", config.organization.name));
        CliFormatter::kv("Config", &config_path.display().to_string());
        CliFormatter::kv("Database", &db_path.display().to_string());
        CliFormatter::kv("Migrations applied", &applied.len().to_string());
    }
    Ok(())
}

fn cmd_migrate(action: MigrateAction, db_path: &Path, json: bool) -> Result<()> {
    let db = Database::open(db_path).with_context(|| format!("opening database {}", db_path.display()))?;
    let runner = MigrationRunner::new();

    match action {
        MigrateAction::Status => {
            let status = runner.check(&db)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "applied": status.applied_count,
                        "pending": status.pending_count,
                        "pending_migrations": status.pending_migrations,
                    })
                );
            } else {
                CliFormatter::header("Migration Status");
                CliFormatter::kv("Applied", &status.applied_count.to_string());
                CliFormatter::kv("Pending", &status.pending_count.to_string());
                for name in &status.pending_migrations {
                    CliFormatter::item(name);
                }
            }
        }
        MigrateAction::Push => {
            let applied = runner.push(&db)?;
            if json {
                println!("{}", serde_json::json!({ "success": true, "applied": applied }));
            } else if applied.is_empty() {
                CliFormatter::success("No pending migrations");
            } else {
                CliFormatter::success(&format!("Applied {} migration(s)", applied.len()));
                for name in &applied {
                    CliFormatter::item(name);
                }
            }
        }
    }
    Ok(())
}

fn cmd_register(db: &Database, credentials: &Credentials, role: &str, profile: &ProfileFields, json: bool) -> Result<()> {
    let identity = AuthService::new(db).register(&credentials.username, &credentials.password, role, profile)?;

    if json {
        println!("{}", serde_json::to_string(&identity)?);
    } else {
        CliFormatter::success(&format!(
            "Registered {} '{}' (id {})",
            identity.role, identity.username, identity.id
        ));
    }
    Ok(())
}

fn login<'a>(db: &'a Database, credentials: &Credentials) -> Result<Session<'a>> {
    let identity = AuthService::new(db).authenticate(&credentials.username, &credentials.password)?;
    Ok(Session::new(db, identity))
}

fn cmd_login(db: &Database, credentials: &Credentials, json: bool) -> Result<()> {
    let session = login(db, credentials)?;
    let identity = session.identity();
    let screens = session.visible_entities();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "identity": identity,
                "screens": screens,
            })
        );
    } else {
        CliFormatter::success(&format!("Logged in as {} '{}'", identity.role, identity.username));
        CliFormatter::header("Screens");
        for kind in screens {
            CliFormatter::item(kind.schema().title);
        }
    }
    Ok(())
}

fn cmd_list(db: &Database, credentials: &Credentials, entity: EntityKind, json: bool) -> Result<()> {
    let session = login(db, credentials)?;
    let rows = session.list(entity)?;

    if json {
        println!("{}", serde_json::to_string(&rows)?);
    } else {
        CliFormatter::header(entity.schema().title);
        CliFormatter::records(entity, &rows);
    }
    Ok(())
}

fn cmd_submit(
    db: &Database,
    credentials: &Credentials,
    entity: EntityKind,
    state: FormState,
    set: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let session = login(db, credentials)?;
    let (_, outcome) = state.submit(&session, entity, &field_values(set))?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    let verb = if state.can_add() { "Added" } else { "Updated" };
    CliFormatter::success(&format!("{} {} {}", verb, entity.singular(), outcome.id));
    match outcome.rows {
        Some(rows) => CliFormatter::records(entity, &rows),
        None => CliFormatter::warning("Saved, but the listing could not be reloaded"),
    }
    Ok(())
}

fn cmd_delete(db: &Database, credentials: &Credentials, entity: EntityKind, id: i64, yes: bool, json: bool) -> Result<()> {
    let session = login(db, credentials)?;
    let confirmer = |prompt: &str| yes || prompt_yes_no(prompt);
    let (_, outcome) = FormState::Idle.select(id).delete(&session, entity, &confirmer)?;

    if json {
        println!("{}", serde_json::json!({ "id": id, "outcome": outcome }));
    } else {
        match outcome {
            DeleteOutcome::Deleted => CliFormatter::success(&format!("Deleted {} {}", entity.singular(), id)),
            DeleteOutcome::Cancelled => CliFormatter::warning("Delete cancelled"),
        }
    }
    Ok(())
}

/// Ask on the terminal; anything but y/yes declines
fn prompt_yes_no(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
