// CommerceOS: gestión multi-tenant de caja diaria, inventario y reportes.

pub mod error;
pub mod models;
pub mod reports;
pub mod routes;
pub mod session;
pub mod state;
pub mod stats;
pub mod totp;
