mod batch;
mod car;
mod category;
mod category_type;
mod journey;
mod nutrition;
mod waste;

pub use batch::{Batch, BATCH_NAME_MAX, BATCH_NAME_MIN};
pub use car::{AllocationRow, CarAllocation, CarAllocationDraft, CarAllocationError};
pub use category::{CategoryRow, DairyFigures};
pub use category_type::{CategoryKind, CategoryType};
pub use journey::{HerdTab, Journey, JourneyStatus, Phase};
pub use nutrition::{
    AdditiveEntry, ConcentrateEntry, FeedOrigin, GrazingEntry, IngredientEntry, NutritionRecord,
    ProductionSystem,
};
pub use waste::{ManagementType, WasteGroup, WasteRecord};
