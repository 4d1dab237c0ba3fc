// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection, bson::doc};
use std::env;

use crate::models::{
    CashAudit, CashSession, Commitment, HistoricalPrice, Organization, Product, Provider, Session,
    StoredFile, Supply, User, UserOrganization, WastageRecord,
};

mod cash;
mod catalog;
mod commitments;
mod files;
mod orgs;
mod users;
mod wastage;

pub use cash::*;
pub use catalog::*;
pub use commitments::*;
pub use files::*;
pub use orgs::*;
pub use users::*;
pub use wastage::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day
pub const ACTIVE_ORG_TTL_SECONDS: u64 = 60 * 60 * 24 * 365; // 1 year
/// Absolute cost/price change below which no history entry is recorded.
pub const PRICE_HISTORY_THRESHOLD: f64 = 0.01;

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub users: Collection<User>,
    pub user_orgs: Collection<UserOrganization>,
    pub orgs: Collection<Organization>,
    pub sessions: Collection<Session>,
    pub products: Collection<Product>,
    pub supplies: Collection<Supply>,
    pub historical_prices: Collection<HistoricalPrice>,
    pub providers: Collection<Provider>,
    pub commitments: Collection<Commitment>,
    pub wastage: Collection<WastageRecord>,
    pub cash_sessions: Collection<CashSession>,
    pub cash_audits: Collection<CashAudit>,
    pub report_files: Collection<StoredFile>,
    pub logo_files: Collection<StoredFile>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "commerceos".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    let state = AppState {
        client,
        users: db.collection::<User>("users"),
        user_orgs: db.collection::<UserOrganization>("user_organizations"),
        orgs: db.collection::<Organization>("organizations"),
        sessions: db.collection::<Session>("sessions"),
        products: db.collection::<Product>("products"),
        supplies: db.collection::<Supply>("supplies"),
        historical_prices: db.collection::<HistoricalPrice>("historical_prices"),
        providers: db.collection::<Provider>("providers"),
        commitments: db.collection::<Commitment>("commitments"),
        wastage: db.collection::<WastageRecord>("wastage_records"),
        cash_sessions: db.collection::<CashSession>("cash_sessions"),
        cash_audits: db.collection::<CashAudit>("cash_audits"),
        report_files: db.collection::<StoredFile>("report_files"),
        logo_files: db.collection::<StoredFile>("logo_files"),
    };

    bootstrap_admin(&state).await?;
    Ok(state)
}

/// First-run bootstrap: with an empty users collection, create the initial
/// admin and its organization, and log the TOTP secret once for enrollment.
async fn bootstrap_admin(state: &AppState) -> Result<()> {
    if state.users.find_one(doc! {}).await?.is_some() {
        return Ok(());
    }

    let email =
        env::var("COMMERCEOS_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let org_name = env::var("COMMERCEOS_ADMIN_ORG").unwrap_or_else(|_| "Mi Negocio".to_string());
    let secret = crate::totp::generate_base32_secret(crate::totp::DEFAULT_SECRET_BYTES);

    let user_id = create_user(state, &email, &secret).await?;
    create_organization(state, &org_name, None, &user_id).await?;
    tracing::info!(%email, %secret, "bootstrap admin created; enroll this TOTP secret");
    Ok(())
}
