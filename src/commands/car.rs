use clap::{Args, Subcommand};

use herdwise_core::{CarAllocationDraft, Wizard};

use super::{resolve_batch, row_index, OutputFormat};

#[derive(Args)]
pub struct CarCommand {
    #[command(subcommand)]
    pub command: CarSubcommand,
}

#[derive(Subcommand)]
pub enum CarSubcommand {
    /// Show how a category's purchased animals are split across CAR codes
    Show {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category row number (starting at 1)
        row: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Allocate a category's purchased animals to CAR codes
    Allocate {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category row number (starting at 1)
        row: usize,

        /// Allocations as CODE=COUNT (can be repeated)
        #[arg(required = true, value_name = "CODE=COUNT")]
        allocations: Vec<String>,
    },
}

/// Parses `CODE=COUNT`.
fn parse_allocation(value: &str) -> Result<(String, u32), String> {
    let (code, count) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("Invalid allocation '{}'. Expected CODE=COUNT", value))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("Invalid head count in '{}'", value))?;
    Ok((code.trim().to_string(), count))
}

fn fill_draft(draft: &mut CarAllocationDraft, allocations: &[(String, u32)]) {
    for (i, (code, count)) in allocations.iter().enumerate() {
        let index = if i == 0 { 0 } else { draft.add_row() };
        draft.set_row(index, code.as_str(), *count);
    }
}

impl CarCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CarSubcommand::Show { batch, row, format } => {
                let handle = resolve_batch(wizard, batch)?;
                let draft = wizard.open_car_allocation(handle, row_index(*row)?).await?;
                match format {
                    OutputFormat::Json => {
                        let allocations = draft.to_allocations();
                        println!("{}", serde_json::to_string_pretty(&allocations)?);
                    }
                    OutputFormat::Text => {
                        for r in draft.rows() {
                            let code = if r.car_code.is_empty() { "-" } else { r.car_code.as_str() };
                            println!("{:<30} {:>6}", code, r.head_count);
                        }
                        println!("Allocated {} of {} purchased", draft.allocated(), draft.purchased);
                    }
                }
                Ok(())
            }

            CarSubcommand::Allocate {
                batch,
                row,
                allocations,
            } => {
                let allocations = allocations
                    .iter()
                    .map(|a| parse_allocation(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let handle = resolve_batch(wizard, batch)?;
                let existing = wizard.open_car_allocation(handle, row_index(*row)?).await?;

                let mut draft = CarAllocationDraft::new(existing.category_id, existing.purchased);
                fill_draft(&mut draft, &allocations);
                let stored = wizard.confirm_car_allocation(&draft).await?;
                println!("Stored {} CAR allocation(s)", stored.len());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_parse_allocation() {
        assert_eq!(
            parse_allocation("MT-5107909-A=12").unwrap(),
            ("MT-5107909-A".to_string(), 12)
        );
        assert!(parse_allocation("MT-1").is_err());
        assert!(parse_allocation("MT-1=doze").is_err());
    }

    #[test]
    fn test_fill_draft_matches_purchased() {
        let mut draft = CarAllocationDraft::new(Uuid::new_v4(), 20);
        fill_draft(
            &mut draft,
            &[("MT-A".to_string(), 12), ("MT-B".to_string(), 8)],
        );
        assert_eq!(draft.rows().len(), 2);
        assert!(draft.can_confirm());
    }
}
