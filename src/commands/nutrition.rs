use clap::{Args, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

use herdwise_core::models::{AdditiveEntry, ConcentrateEntry, GrazingEntry, IngredientEntry};
use herdwise_core::{CategoryRow, NutritionRecord, ProductionSystem, Wizard};

use super::{resolve_batch, save, show, OutputFormat};

#[derive(Args)]
pub struct NutritionCommand {
    #[command(subcommand)]
    pub command: NutritionSubcommand,
}

#[derive(Subcommand)]
pub enum NutritionSubcommand {
    /// Show the feed data of a batch
    Show {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import feed data for a batch from a YAML file
    Import {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// YAML file with the feed data
        file: PathBuf,
    },
}

/// Feed data file. Rows are matched to category rows by type code.
///
/// ```yaml
/// includes_feed_data: true
/// production_system: semi-confined
/// rows:
///   - category: boi
///     grazing: { hours_per_day: 8, days_per_year: 200 }
///     ingredient: { name: silagem de milho, quantity_kg: 12, offer_days: 120 }
/// ```
#[derive(Debug, Deserialize)]
struct NutritionFile {
    includes_feed_data: Option<bool>,
    production_system: Option<String>,
    #[serde(default)]
    rows: Vec<NutritionFileRow>,
}

#[derive(Debug, Deserialize)]
struct NutritionFileRow {
    category: String,
    grazing: Option<GrazingEntry>,
    ingredient: Option<IngredientEntry>,
    concentrate: Option<ConcentrateEntry>,
    additive: Option<AdditiveEntry>,
}

impl NutritionFile {
    /// Pairs each file row with the index of its category row.
    fn locate<'a>(
        &'a self,
        categories: &[CategoryRow],
    ) -> Result<Vec<(usize, &'a NutritionFileRow)>, String> {
        self.rows
            .iter()
            .map(|entry| {
                let code = entry.category.trim().to_lowercase();
                categories
                    .iter()
                    .position(|row| row.identity() == Some(code.as_str()))
                    .map(|index| (index, entry))
                    .ok_or_else(|| format!("No category row of type '{}' in this batch", code))
            })
            .collect()
    }

    fn apply(
        &self,
        system: Option<ProductionSystem>,
        located: &[(usize, &NutritionFileRow)],
        record: &mut NutritionRecord,
    ) {
        if let Some(includes) = self.includes_feed_data {
            record.includes_feed_data = includes;
        }
        if system.is_some() {
            record.production_system = system;
        }
        for &(index, entry) in located {
            if let (Some(slot), Some(grazing)) = (record.grazing.get_mut(index), &entry.grazing) {
                *slot = grazing.clone();
            }
            if let (Some(slot), Some(ingredient)) =
                (record.ingredients.get_mut(index), &entry.ingredient)
            {
                *slot = ingredient.clone();
            }
            if let (Some(slot), Some(concentrate)) =
                (record.concentrates.get_mut(index), &entry.concentrate)
            {
                *slot = concentrate.clone();
            }
            if let (Some(slot), Some(additive)) = (record.additives.get_mut(index), &entry.additive)
            {
                *slot = additive.clone();
            }
        }
    }
}

fn print_record(categories: &[CategoryRow], record: &NutritionRecord) {
    println!(
        "Feed data: {}",
        if record.includes_feed_data { "yes" } else { "no" }
    );
    if let Some(system) = record.production_system {
        println!("Production system: {}", system);
    }
    if !record.includes_feed_data {
        return;
    }
    for (i, row) in categories.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, row.label());
        if let Some(g) = record.grazing.get(i) {
            println!(
                "   grazing: {} h/day, {} days/year",
                show(g.hours_per_day),
                show(g.days_per_year)
            );
        }
        if let Some(ing) = record.ingredients.get(i).filter(|e| !e.name.is_empty()) {
            println!(
                "   ingredient: {} ({} kg, {} days)",
                ing.name,
                show(ing.quantity_kg),
                show(ing.offer_days)
            );
        }
        if let Some(c) = record.concentrates.get(i).filter(|c| c.quantity_kg.is_some()) {
            println!(
                "   concentrate: {} kg, {}% protein, {} days",
                show(c.quantity_kg),
                show(c.protein_pct),
                show(c.offer_days)
            );
        }
        if let Some(a) = record.additives.get(i) {
            if let Some(additive_type) = &a.additive_type {
                println!("   additive: {} (dose {})", additive_type, show(a.dose));
            }
        }
    }
}

impl NutritionCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            NutritionSubcommand::Show { batch, format } => {
                let handle = resolve_batch(wizard, batch)?;
                let Some(set) = wizard.rows(handle) else {
                    return Ok(());
                };
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&set.nutrition)?);
                    }
                    OutputFormat::Text => print_record(&set.categories, &set.nutrition),
                }
                Ok(())
            }

            NutritionSubcommand::Import { batch, file } => {
                let handle = resolve_batch(wizard, batch)?;
                let contents = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let data: NutritionFile = serde_yaml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;
                let system = data
                    .production_system
                    .as_deref()
                    .map(ProductionSystem::from_str)
                    .transpose()?;

                let categories = wizard
                    .rows(handle)
                    .map(|s| s.categories.clone())
                    .unwrap_or_default();
                let located = data.locate(&categories)?;
                wizard.edit_nutrition(handle, |record| data.apply(system, &located, record))?;
                save(wizard).await?;
                println!("Imported feed data for {} categories", located.len());
                Ok(())
            }
        }
    }
}
