pub mod dto;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use dto::{
    PetProfileDto, ServiceProviderDto, ServiceRequestDto, SyncReport, SyncRequest,
};
pub use error::{RatingError, SyncError};
pub use model::{Change, PetProfile, Rating, ServiceProvider, ServiceRequest, SyncLog};
pub use service::SyncService;
pub use store::Resolved;
