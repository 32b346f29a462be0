use clap::{Args, Subcommand};

use herdwise_core::models::CategoryRow;
use herdwise_core::validation::missing_category_fields;
use herdwise_core::{CategoryKind, CategoryType, Wizard};
use uuid::Uuid;

use super::{resolve_batch, row_index, save, show, OutputFormat};

#[derive(Args)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

/// Animal counts and figures of one category row.
#[derive(Args, Default)]
pub struct RowFields {
    /// Head count on the farm
    #[arg(long)]
    on_farm: Option<u32>,

    /// Average live weight in kg
    #[arg(long)]
    weight: Option<f64>,

    /// Head purchased in the period
    #[arg(long)]
    purchased: Option<u32>,

    /// Average weight of purchased animals in kg
    #[arg(long)]
    purchased_weight: Option<f64>,

    /// Head sold in the period
    #[arg(long)]
    sold: Option<u32>,

    /// Average weight of sold animals in kg
    #[arg(long)]
    sold_weight: Option<f64>,

    /// Months the animals stay on the farm
    #[arg(long)]
    months: Option<u32>,

    /// Weaning age in months (calves)
    #[arg(long)]
    weaning_age: Option<f64>,

    /// Pregnant share in percent (lactating cows)
    #[arg(long)]
    pregnant_pct: Option<f64>,

    /// Milk yield in litres per year (lactating cows)
    #[arg(long)]
    milk_yield: Option<f64>,

    /// Milk fat in percent (lactating cows)
    #[arg(long)]
    fat_pct: Option<f64>,

    /// Milk protein in percent (lactating cows)
    #[arg(long)]
    protein_pct: Option<f64>,
}

impl RowFields {
    fn apply(&self, row: &mut CategoryRow) {
        fn set<T: Copy>(field: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *field = value;
            }
        }
        set(&mut row.on_farm_count, self.on_farm);
        set(&mut row.average_weight_kg, self.weight);
        set(&mut row.purchased_count, self.purchased);
        set(&mut row.purchased_weight_kg, self.purchased_weight);
        set(&mut row.sold_count, self.sold);
        set(&mut row.sold_weight_kg, self.sold_weight);
        set(&mut row.months_of_stay, self.months);
        set(&mut row.weaning_age_months, self.weaning_age);
        set(&mut row.dairy.pregnant_pct, self.pregnant_pct);
        set(&mut row.dairy.milk_yield_l_year, self.milk_yield);
        set(&mut row.dairy.fat_pct, self.fat_pct);
        set(&mut row.dairy.protein_pct, self.protein_pct);
    }
}

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// Add a category row to a batch
    Add {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Category type code (see `category types`)
        #[arg(long = "type", value_name = "CODE")]
        category_type: String,

        #[command(flatten)]
        fields: RowFields,
    },

    /// Edit a category row
    Edit {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Row number (starting at 1)
        row: usize,

        /// New category type code
        #[arg(long = "type", value_name = "CODE")]
        category_type: Option<String>,

        #[command(flatten)]
        fields: RowFields,
    },

    /// List the category rows of a batch
    List {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove a category row
    Remove {
        /// Batch name
        #[arg(long)]
        batch: String,

        /// Row number (starting at 1)
        row: usize,
    },

    /// List the available category types
    Types {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn lookup_type(code: &str) -> Result<CategoryType, String> {
    CategoryType::lookup(code.trim()).ok_or_else(|| {
        format!(
            "Unknown category type '{}'. Run `herdwise category types` for the list",
            code
        )
    })
}

/// Incomplete rows are never written, so the next run would not see them.
fn ensure_complete(wizard: &Wizard, handle: Uuid, index: usize) -> Result<(), String> {
    let missing = wizard
        .rows(handle)
        .and_then(|set| set.categories.get(index))
        .map(missing_category_fields)
        .unwrap_or_default();
    if missing.is_empty() {
        return Ok(());
    }
    Err(format!(
        "Row {} was not saved, it is missing: {}",
        index + 1,
        missing.join(", ")
    ))
}

fn kind_label(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Calf => "calf",
        CategoryKind::Dairy => "dairy",
        CategoryKind::General => "general",
    }
}

impl CategoryCommand {
    pub async fn run(&self, wizard: &mut Wizard) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CategorySubcommand::Add {
                batch,
                category_type,
                fields,
            } => {
                let handle = resolve_batch(wizard, batch)?;
                let category_type = lookup_type(category_type)?;
                let rows = wizard.rows(handle).map(|s| s.categories.clone()).unwrap_or_default();
                if rows.iter().any(|r| r.identity() == Some(category_type.code.as_str())) {
                    return Err(format!(
                        "Batch '{}' already has a {} row",
                        batch.trim(),
                        category_type.code
                    )
                    .into());
                }

                // A batch starts with one blank row; fill it before adding more.
                let index = match rows.as_slice() {
                    [only] if only.category_type.is_none() => 0,
                    _ => wizard.add_category_row(handle)?,
                };
                let label = category_type.label.clone();
                wizard.edit_category_row(handle, index, |row| {
                    row.category_type = Some(category_type);
                    fields.apply(row);
                })?;
                ensure_complete(wizard, handle, index)?;
                save(wizard).await?;
                println!("Added {} as row {}", label, index + 1);
                Ok(())
            }

            CategorySubcommand::Edit {
                batch,
                row,
                category_type,
                fields,
            } => {
                let handle = resolve_batch(wizard, batch)?;
                let index = row_index(*row)?;
                let category_type = category_type.as_deref().map(lookup_type).transpose()?;
                wizard.edit_category_row(handle, index, |target| {
                    if let Some(category_type) = category_type {
                        target.category_type = Some(category_type);
                    }
                    fields.apply(target);
                })?;
                ensure_complete(wizard, handle, index)?;
                save(wizard).await?;
                println!("Updated row {}", row);
                Ok(())
            }

            CategorySubcommand::List { batch, format } => {
                let handle = resolve_batch(wizard, batch)?;
                let rows = wizard.rows(handle).map(|s| s.categories.as_slice()).unwrap_or_default();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(rows)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<4} {:<26} {:>8} {:>9} {:>9} {:>6} {:>7}  SAVED",
                            "#", "CATEGORY", "ON FARM", "WEIGHT", "PURCHASED", "SOLD", "MONTHS"
                        );
                        println!("{}", "-".repeat(84));
                        for (i, row) in rows.iter().enumerate() {
                            println!(
                                "{:<4} {:<26} {:>8} {:>9} {:>9} {:>6} {:>7}  {}",
                                i + 1,
                                row.label(),
                                show(row.on_farm_count),
                                show(row.average_weight_kg),
                                show(row.purchased_count),
                                show(row.sold_count),
                                show(row.months_of_stay),
                                if row.id.is_some() { "yes" } else { "no" }
                            );
                        }
                    }
                }
                Ok(())
            }

            CategorySubcommand::Remove { batch, row } => {
                let handle = resolve_batch(wizard, batch)?;
                let removed = wizard.remove_category_row(handle, row_index(*row)?).await?;
                save(wizard).await?;
                println!("Removed {}", removed.label());
                Ok(())
            }

            CategorySubcommand::Types { format } => {
                let catalog = CategoryType::catalog();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&catalog)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<16} {:<26} KIND", "CODE", "LABEL");
                        println!("{}", "-".repeat(52));
                        for t in &catalog {
                            println!("{:<16} {:<26} {}", t.code, t.label, kind_label(t.kind));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
