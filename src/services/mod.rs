pub mod credentials;
pub use credentials::{PasswordVerifier, PlaintextVerifier};

pub mod bootstrap;
pub use bootstrap::ensure_default_admin;

pub mod login_service;
pub mod login_service_impl;
pub use login_service::{LoginError, LoginOutcome, LoginService};
pub use login_service_impl::StoreLoginService;

pub mod admin_gate;
pub use admin_gate::AdminGate;

pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{
    AdminCredentials, AdminError, AdminService, AdminToken, UpsertResult, UserUpsert,
};
pub use admin_service_impl::StoreAdminService;
