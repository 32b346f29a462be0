use clap::{Args, Subcommand};
use serde::Serialize;

use herdwise_core::{Batch, HerdTab, Journey, Phase, Position, Wizard};

use super::OutputFormat;

#[derive(Args)]
pub struct JourneyCommand {
    #[command(subcommand)]
    pub command: JourneySubcommand,
}

#[derive(Subcommand)]
pub enum JourneySubcommand {
    /// Show the journey, its progress and batches
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Switch herd tab (information, nutrition, management)
    Tab {
        /// Target tab
        tab: HerdTab,
    },

    /// Move one step forward
    Advance,

    /// Move one step back
    Retreat,

    /// Jump to a phase (herd, grazing, land-use-change, energy)
    Phase {
        /// Target phase
        phase: Phase,
    },
}

#[derive(Serialize)]
struct JourneyView<'a> {
    journey: &'a Journey,
    batches: &'a [Batch],
}

fn describe(position: Position) -> String {
    match position {
        Position::Tab(tab) => format!("herd / {}", tab.label()),
        Position::Phase(phase) => phase.to_string(),
        Position::Completed => "completed".to_string(),
    }
}

impl JourneyCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            JourneySubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        let view = JourneyView {
                            journey: wizard.journey(),
                            batches: wizard.batches(),
                        };
                        println!("{}", serde_json::to_string_pretty(&view)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", wizard.journey());
                        println!();
                        if wizard.batches().is_empty() {
                            println!("No batches yet.");
                        } else {
                            println!("Batches:");
                            for batch in wizard.batches() {
                                let rows = wizard.rows(batch.handle).map_or(0, |s| s.len());
                                println!("  {} ({} categories)", batch, rows);
                            }
                        }
                    }
                }
                Ok(())
            }

            JourneySubcommand::Tab { tab } => {
                wizard.select_tab(*tab).await?;
                println!("Now at {}", describe(wizard.position()));
                Ok(())
            }

            JourneySubcommand::Advance => {
                let position = wizard.advance().await?;
                println!("Now at {}", describe(position));
                Ok(())
            }

            JourneySubcommand::Retreat => {
                let position = wizard.retreat().await?;
                println!("Now at {}", describe(position));
                Ok(())
            }

            JourneySubcommand::Phase { phase } => {
                wizard.select_phase(*phase).await?;
                println!("Now at {}", describe(wizard.position()));
                Ok(())
            }
        }
    }
}
