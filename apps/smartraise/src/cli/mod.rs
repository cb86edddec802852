//! # SmartRaise CLI Module
//!
//! This module implements the CLI interface for SmartRaise.
//!
//! ## Available Commands
//!
//! - `serve` - Load artifacts and start the prediction service
//! - `predict` - Run one prediction locally
//! - `ingest` - Replace the HR collections from a spreadsheet
//! - `status` - Show document store counts
//! - `employees` - List employees, or show one
//! - `performance` - Show one employee's performance history
//! - `department` - Summarise a department's performance
//! - `inspect` - Describe an artifact file
//! - `convert` - Re-encode an artifact file

mod commands;

use crate::config::{Config, PredictionShape};
use clap::{Parser, Subcommand, ValueEnum};
use smartraise_core::Result;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SmartRaise - employee performance prediction
///
/// Serves predictions from a fitted scaler and model, and loads HR
/// spreadsheets into the document store.
#[derive(Parser, Debug)]
#[command(name = "smartraise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./smartraise.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Artifact paths shared by every command that loads the pipeline.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Model artifact (overrides artifacts.model)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Scaler artifact (overrides artifacts.scaler)
    #[arg(short, long)]
    pub scaler: Option<PathBuf>,
}

impl ArtifactArgs {
    fn apply(self, config: &mut Config) {
        if let Some(model) = self.model {
            config.artifacts.model = Some(model);
        }
        if let Some(scaler) = self.scaler {
            config.artifacts.scaler = Some(scaler);
        }
    }
}

/// Target encoding for `convert`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactEncoding {
    Binary,
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP prediction service
    Serve {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Host to bind to (overrides server.host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Response shape (overrides server.prediction_shape)
        #[arg(long, value_enum)]
        prediction_shape: Option<ShapeArg>,
    },

    /// Predict from one feature vector
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Raw feature values, in fitted order
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        features: Vec<f64>,
    },

    /// Replace the employees and performances collections from a spreadsheet
    Ingest {
        /// Source file (.csv, .xlsx, .xls, .ods)
        #[arg(short, long)]
        file: PathBuf,

        /// Document database (overrides ingest.database)
        #[arg(short = 'D', long)]
        database: Option<PathBuf>,

        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Do not run the post-ingest prediction
        #[arg(long)]
        skip_smoke_test: bool,
    },

    /// Show document store counts
    Status {
        /// Document database (overrides ingest.database)
        #[arg(short = 'D', long)]
        database: Option<PathBuf>,
    },

    /// List ingested employees, or show one by identifier
    Employees {
        /// Show only this employee
        #[arg(long)]
        id: Option<String>,

        /// Document database (overrides ingest.database)
        #[arg(short = 'D', long)]
        database: Option<PathBuf>,
    },

    /// Show the performance history of one employee
    Performance {
        /// Employee identifier (EmpNumber)
        employee: String,

        /// Document database (overrides ingest.database)
        #[arg(short = 'D', long)]
        database: Option<PathBuf>,
    },

    /// Average performance scores across a department
    Department {
        /// Department name, matched exactly
        name: String,

        /// Document database (overrides ingest.database)
        #[arg(short = 'D', long)]
        database: Option<PathBuf>,
    },

    /// Describe an artifact file
    Inspect {
        /// Artifact file (scaler or model, either encoding)
        path: PathBuf,
    },

    /// Re-encode an artifact file
    Convert {
        /// Input artifact
        #[arg(short, long)]
        input: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Output encoding
        #[arg(short = 't', long = "to", value_enum, default_value = "binary")]
        to: ArtifactEncoding,
    },
}

/// `--prediction-shape` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeArg {
    Scalar,
    List,
}

impl From<ShapeArg> for PredictionShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Scalar => Self::Scalar,
            ShapeArg::List => Self::List,
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

fn override_database(config: &mut Config, database: Option<PathBuf>) {
    if let Some(database) = database {
        config.ingest.database = database;
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Serve {
            artifacts,
            host,
            port,
            prediction_shape,
        } => {
            artifacts.apply(&mut config);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(shape) = prediction_shape {
                config.server.prediction_shape = shape.into();
            }
            cmd_serve(&config).await
        }
        Commands::Predict {
            artifacts,
            features,
        } => {
            artifacts.apply(&mut config);
            cmd_predict(&config, &features, json_mode)
        }
        Commands::Ingest {
            file,
            database,
            artifacts,
            skip_smoke_test,
        } => {
            artifacts.apply(&mut config);
            if let Some(database) = database {
                config.ingest.database = database;
            }
            if skip_smoke_test {
                config.ingest.smoke_test = false;
            }
            cmd_ingest(&config, &file, json_mode)
        }
        Commands::Status { database } => {
            override_database(&mut config, database);
            cmd_status(&config, json_mode)
        }
        Commands::Employees { id, database } => {
            override_database(&mut config, database);
            cmd_employees(&config, id.as_deref(), json_mode)
        }
        Commands::Performance { employee, database } => {
            override_database(&mut config, database);
            cmd_performance(&config, &employee, json_mode)
        }
        Commands::Department { name, database } => {
            override_database(&mut config, database);
            cmd_department(&config, &name, json_mode)
        }
        Commands::Inspect { path } => cmd_inspect(&path, json_mode),
        Commands::Convert { input, output, to } => cmd_convert(&input, &output, to, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_features() {
        let cli = Cli::try_parse_from(["smartraise", "predict", "-m", "m", "--", "1.5", "-2", "3"])
            .expect("parse");
        match cli.command {
            Commands::Predict { features, .. } => assert_eq!(features, vec![1.5, -2.0, 3.0]),
            _ => unreachable!("parsed into another command"),
        }
    }

    #[test]
    fn ingest_flags() {
        let cli = Cli::try_parse_from([
            "smartraise",
            "--json-mode",
            "ingest",
            "-f",
            "hr.xlsx",
            "--skip-smoke-test",
        ])
        .expect("parse");
        assert!(cli.json_mode);
        assert!(matches!(
            cli.command,
            Commands::Ingest {
                skip_smoke_test: true,
                ..
            }
        ));
    }

    #[test]
    fn read_commands_take_positional_keys() {
        let cli = Cli::try_parse_from(["smartraise", "performance", "E1001", "-D", "hr.redb"])
            .expect("parse");
        match cli.command {
            Commands::Performance { employee, database } => {
                assert_eq!(employee, "E1001");
                assert_eq!(database, Some(PathBuf::from("hr.redb")));
            }
            _ => unreachable!("parsed into another command"),
        }

        let cli = Cli::try_parse_from(["smartraise", "department", "Sales"]).expect("parse");
        assert!(matches!(cli.command, Commands::Department { ref name, .. } if name == "Sales"));

        let cli = Cli::try_parse_from(["smartraise", "employees", "--id", "E7"]).expect("parse");
        assert!(matches!(cli.command, Commands::Employees { id: Some(ref id), .. } if id == "E7"));
    }

    #[test]
    fn serve_shape_flag() {
        let cli = Cli::try_parse_from(["smartraise", "serve", "--prediction-shape", "list"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Serve {
                prediction_shape: Some(ShapeArg::List),
                ..
            }
        ));
    }
}
