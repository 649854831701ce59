//! SportsOrg CLI Module
//! Command-line interface for account and record operations

pub mod formatter;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::records::{EntityKind, FieldValues};

#[derive(Parser, Debug)]
#[command(name = "sportsorg")]
#[command(version)]
#[command(about = "Records of a sports organization: athletes, trainers, judges, medals, organizers", long_about = None)]
pub struct Cli {
    /// Directory holding sportsorg.config.json (defaults to current directory)
    #[arg(short, long, global = true, env = "SPORTSORG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(long, global = true, env = "SPORTSORG_DB")]
    pub db: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Login credentials for commands that act as a user
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long, env = "SPORTSORG_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config and create the database
    Init {
        /// Organization name stored in the config
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Create an account
    Register {
        #[command(flatten)]
        credentials: Credentials,

        /// athlete, trainer, judge or organizer
        #[arg(short, long)]
        role: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,
    },

    /// Check credentials and show the screens available to the account
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// List the rows of an entity visible to the user
    List {
        entity: EntityKind,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Add a row
    Add {
        entity: EntityKind,

        /// Field value as name=value, repeatable
        #[arg(short, long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Change fields of an existing row
    Edit {
        entity: EntityKind,

        id: i64,

        /// Field value as name=value, repeatable
        #[arg(short, long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Delete a row after confirmation
    Delete {
        entity: EntityKind,

        id: i64,

        /// Do not prompt for confirmation
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Show applied and pending migrations
    Status,

    /// Apply pending migrations
    Push,
}

impl Cli {
    pub fn get_config_dir(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// Parse a `name=value` pair. The value may be empty or contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn field_values(pairs: Vec<(String, String)>) -> FieldValues {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(parse_key_val("weight=1.5").unwrap(), ("weight".to_string(), "1.5".to_string()));
        assert_eq!(parse_key_val("email=a=b").unwrap().1, "a=b");
        assert_eq!(parse_key_val("birth_date=").unwrap().1, "");
        assert!(parse_key_val("weight").is_err());
        assert!(parse_key_val("=1").is_err());
    }

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from([
            "sportsorg", "--db", ":memory:", "list", "medal", "-u", "jo", "-p", "pw",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from(":memory:")));
        match cli.command {
            Commands::List { entity, credentials } => {
                assert_eq!(entity, EntityKind::Medals);
                assert_eq!(credentials.username, "jo");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_edit_with_fields() {
        let cli = Cli::try_parse_from([
            "sportsorg", "edit", "athletes", "3", "--set", "phone_number=555", "--set",
            "sport_rank=1", "-u", "boss", "-p", "pw", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Edit { entity, id, set, .. } => {
                assert_eq!(entity, EntityKind::Athletes);
                assert_eq!(id, 3);
                let fields = field_values(set);
                assert_eq!(fields.get("sport_rank").map(String::as_str), Some("1"));
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_entity_rejected() {
        assert!(Cli::try_parse_from(["sportsorg", "list", "coaches", "-u", "x", "-p", "y"]).is_err());
    }
}
