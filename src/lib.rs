pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod wire;

pub use api::{NewAccount, NewNotification, NewPanel, NewPlateup, NewRecipe, PanelOrder,
    PanelPatch, RecipeFilter, RequestStatus, TeamMemberPatch, Upload};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use session::{Session, SessionHandle, SessionVault};
