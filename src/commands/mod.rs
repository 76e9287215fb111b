//! Command-line surface
//!
//! The terminal is the presentation layer: it renders the state published by
//! the services and the interview session, and feeds operator input back.

pub mod cases;
pub mod interview;
pub mod render;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;

use crate::domain::{ApplianceType, NewCase};
use crate::services::EngineClient;

#[derive(Debug, Parser)]
#[command(name = "diagnosis-client")]
#[command(about = "Guided appliance diagnosis against the inference engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List cases, most recent first, with the metrics snapshot
    Cases,

    /// Register a new case
    New(NewCaseArgs),

    /// Run the interview for a case
    Interview {
        /// Case id
        case_id: i64,
    },

    /// Show the final result of a case
    Result {
        /// Case id
        case_id: i64,
    },
}

#[derive(Debug, Args)]
pub struct NewCaseArgs {
    /// Client name
    #[arg(long)]
    pub name: String,

    /// Client phone
    #[arg(long)]
    pub phone: String,

    /// HELADERA, LAVARROPAS or MICROONDAS
    #[arg(long)]
    pub appliance: ApplianceType,

    #[arg(long)]
    pub brand: String,

    #[arg(long, default_value = "")]
    pub model: String,

    /// Appliance age in years
    #[arg(long, default_value_t = 0)]
    pub age: u32,

    /// Symptom as reported by the client
    #[arg(long)]
    pub symptom: String,

    /// Start the interview right after creating the case
    #[arg(long)]
    pub start: bool,
}

impl NewCaseArgs {
    pub fn to_new_case(&self) -> NewCase {
        NewCase {
            cliente_nombre: self.name.trim().to_string(),
            cliente_telefono: self.phone.trim().to_string(),
            tipo: self.appliance,
            marca: self.brand.trim().to_string(),
            modelo: self.model.trim().to_string(),
            antiguedad: self.age,
            sintoma_reportado: self.symptom.trim().to_string(),
        }
    }
}

pub async fn run(cli: Cli, client: Arc<EngineClient>) -> Result<()> {
    match cli.command {
        Command::Cases => cases::list(client.as_ref()).await,
        Command::New(args) => {
            let case_id = cases::create(client.as_ref(), &args.to_new_case()).await?;
            if args.start {
                interview::run(client, case_id).await?;
            }
            Ok(())
        }
        Command::Interview { case_id } => interview::run(client, case_id).await,
        Command::Result { case_id } => cases::show_result(client.as_ref(), case_id).await,
    }
}
