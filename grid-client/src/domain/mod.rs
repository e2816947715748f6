pub mod carbon;
pub mod fuel;
pub mod region_series;
pub mod usage;

pub use carbon::{CarbonIntensityRecord, ConsumptionBySource, IntensityPoint, NetFootprintRecord};
pub use fuel::{emission_factor, FuelGenerationRecord, FuelShareRecord, FuelType};
pub use region_series::{InterchangeRecord, RegionSeriesKind, RegionSeriesRecord};
pub use usage::PersonalUsageRecord;
