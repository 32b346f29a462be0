use clap::{Args, Subcommand};
use std::io::{self, Write};

use herdwise_core::{Batch, Wizard, WizardError};
use uuid::Uuid;

use super::{resolve_batch, save, OutputFormat};

#[derive(Args)]
pub struct BatchCommand {
    #[command(subcommand)]
    pub command: BatchSubcommand,
}

#[derive(Subcommand)]
pub enum BatchSubcommand {
    /// Add a batch of animals
    Add {
        /// Name of the batch
        name: String,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List batches
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a batch
    Rename {
        /// Current name
        name: String,

        /// New name
        new_name: String,
    },

    /// Remove a batch with all its rows
    Remove {
        /// Name of the batch
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl BatchCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BatchSubcommand::Add { name, notes } => {
                if wizard.find_batch(name).is_some() {
                    return Err(format!("Batch '{}' already exists", name.trim()).into());
                }
                if !Batch::pending(Uuid::nil(), name.trim(), 0).has_valid_name() {
                    return Err(WizardError::InvalidBatchName.into());
                }
                let handle = wizard.add_batch(name);
                if let Some(notes) = notes {
                    wizard.set_batch_notes(handle, notes).await?;
                }
                save(wizard).await?;
                println!("Added batch {}", name.trim());
                Ok(())
            }

            BatchSubcommand::List { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(wizard.batches())?);
                    }
                    OutputFormat::Text => {
                        if wizard.batches().is_empty() {
                            println!("No batches found.");
                            return Ok(());
                        }
                        println!("{:<4} {:<30} {:>10}  NOTES", "#", "NAME", "CATEGORIES");
                        println!("{}", "-".repeat(60));
                        for batch in wizard.batches() {
                            let rows = wizard.rows(batch.handle).map_or(0, |s| s.len());
                            println!(
                                "{:<4} {:<30} {:>10}  {}",
                                batch.order + 1,
                                batch.to_string(),
                                rows,
                                batch.notes
                            );
                        }
                    }
                }
                Ok(())
            }

            BatchSubcommand::Rename { name, new_name } => {
                let handle = resolve_batch(wizard, name)?;
                wizard.rename_batch(handle, new_name).await?;
                save(wizard).await?;
                println!("Renamed batch {} to {}", name.trim(), new_name.trim());
                Ok(())
            }

            BatchSubcommand::Remove { name, force } => {
                let handle = resolve_batch(wizard, name)?;

                if !force {
                    print!(
                        "Remove batch '{}' and all its rows? [y/N] ",
                        name.trim()
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }

                wizard.delete_batch(handle).await?;
                Ok(())
            }
        }
    }
}
