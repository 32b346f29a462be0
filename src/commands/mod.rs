mod batch;
mod car;
mod category;
mod config_cmd;
mod journey;
mod nutrition;
mod waste;

pub use batch::BatchCommand;
pub use car::CarCommand;
pub use category::CategoryCommand;
pub use config_cmd::ConfigCommand;
pub use journey::JourneyCommand;
pub use nutrition::NutritionCommand;
pub use waste::WasteCommand;

use clap::ValueEnum;
use herdwise_core::{Wizard, WizardError};
use uuid::Uuid;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Handle of the batch called `name`.
fn resolve_batch(wizard: &Wizard, name: &str) -> Result<Uuid, WizardError> {
    wizard
        .find_batch(name)
        .map(|b| b.handle)
        .ok_or_else(|| WizardError::UnknownBatch(name.to_string()))
}

/// Converts a 1-based row number given on the command line.
fn row_index(number: usize) -> Result<usize, Box<dyn std::error::Error>> {
    number
        .checked_sub(1)
        .ok_or_else(|| "Row numbers start at 1".into())
}

/// Text for an optional value, `-` when unset.
fn show(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Writes every pending edit. Failures were already reported through the
/// notifier; they still make the command fail.
async fn save(wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
    let report = wizard.flush().await;
    if let Some((batch, err)) = report.failed.first() {
        return Err(format!("Could not save batch {}: {}", batch, err).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_index_is_one_based() {
        assert_eq!(row_index(1).unwrap(), 0);
        assert_eq!(row_index(3).unwrap(), 2);
        assert!(row_index(0).is_err());
    }

    #[test]
    fn test_show_missing_value() {
        assert_eq!(show(None::<u32>), "-");
        assert_eq!(show(Some(12)), "12");
    }
}
