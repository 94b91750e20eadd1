//! Use case implementations.

mod cache_maintenance_use_case;
mod load_images_use_case;

pub use cache_maintenance_use_case::CacheMaintenanceUseCase;
pub use load_images_use_case::LoadImagesUseCase;
