use clap::{Args, Subcommand};

use herdwise_core::{ManagementType, Wizard};

use super::{resolve_batch, row_index, save, show, OutputFormat};

#[derive(Args)]
pub struct WasteCommand {
    #[command(subcommand)]
    pub command: WasteSubcommand,
}

#[derive(Subcommand)]
pub enum WasteSubcommand {
    /// Show the manure management split of a batch
    Show {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Set the type and share of a waste record
    Set {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category type code
        #[arg(long)]
        category: String,

        /// Record number within the category (starting at 1)
        record: usize,

        /// Management type (pasture, daily-spread, solid-storage, ...)
        #[arg(long = "type", value_name = "TYPE")]
        management_type: Option<ManagementType>,

        /// Share of the batch in percent
        #[arg(long)]
        percentage: Option<f64>,
    },

    /// Add a waste record to a category
    Add {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category type code
        #[arg(long)]
        category: String,

        /// Management type
        #[arg(long = "type", value_name = "TYPE")]
        management_type: Option<ManagementType>,

        /// Share of the batch in percent
        #[arg(long)]
        percentage: Option<f64>,
    },

    /// Remove a waste record
    Remove {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category type code
        #[arg(long)]
        category: String,

        /// Record number within the category (starting at 1)
        record: usize,
    },
}

impl WasteCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WasteSubcommand::Show { batch, format } => {
                let handle = resolve_batch(wizard, batch)?;
                let groups = wizard.rows(handle).map(|s| s.waste.as_slice()).unwrap_or_default();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(groups)?);
                    }
                    OutputFormat::Text => {
                        let mut total = 0.0;
                        for group in groups {
                            println!("{} ({})", group.label, group.category);
                            for (i, record) in group.records.iter().enumerate() {
                                total += record.percentage;
                                println!(
                                    "  {}. {:<20} {:>7.2}%",
                                    i + 1,
                                    show(record.management_type),
                                    record.percentage
                                );
                            }
                        }
                        println!();
                        println!("Total: {:.2}%", total);
                    }
                }
                Ok(())
            }

            WasteSubcommand::Set {
                batch,
                category,
                record,
                management_type,
                percentage,
            } => {
                let handle = resolve_batch(wizard, batch)?;
                let index = row_index(*record)?;
                if let Some(management_type) = management_type {
                    wizard.set_waste_type(handle, category, index, *management_type)?;
                }
                if let Some(percentage) = percentage {
                    wizard.set_waste_percentage(handle, category, index, *percentage)?;
                }
                save(wizard).await?;
                Ok(())
            }

            WasteSubcommand::Add {
                batch,
                category,
                management_type,
                percentage,
            } => {
                let handle = resolve_batch(wizard, batch)?;
                let index = wizard.add_waste_record(handle, category)?;
                if let Some(management_type) = management_type {
                    wizard.set_waste_type(handle, category, index, *management_type)?;
                }
                if let Some(percentage) = percentage {
                    wizard.set_waste_percentage(handle, category, index, *percentage)?;
                }
                save(wizard).await?;
                println!("Added record {} to {}", index + 1, category);
                Ok(())
            }

            WasteSubcommand::Remove {
                batch,
                category,
                record,
            } => {
                let handle = resolve_batch(wizard, batch)?;
                wizard.remove_waste_record(handle, category, row_index(*record)?)?;
                save(wizard).await?;
                println!("Removed record {} from {}", record, category);
                Ok(())
            }
        }
    }
}
