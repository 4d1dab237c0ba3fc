// models.rs
// Domain documents for the MongoDB collections and the enums shared with the
// HTTP layer.

use mongodb::bson::{Binary, DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// User roles for authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Staff
    }
}

/// Payment methods accepted at the register. QR, debit and credit may carry a
/// commission fee configured per organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "efectivo")]
    Cash,
    #[serde(rename = "transferencia")]
    Transfer,
    #[serde(rename = "qr")]
    Qr,
    #[serde(rename = "debito")]
    Debit,
    #[serde(rename = "credito")]
    Credit,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Transfer => "Transferencia",
            PaymentMethod::Qr => "QR",
            PaymentMethod::Debit => "Débito",
            PaymentMethod::Credit => "Crédito",
        }
    }
}

/// Expense classification. Business, Purchases/Freight and Investments count
/// as operating expenses; everything else is treated as a withdrawal in the
/// monthly statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpenseCategory {
    #[serde(rename = "negocio")]
    Business,
    #[serde(rename = "compras_fletes")]
    Purchases,
    #[serde(rename = "personal")]
    Personal,
    #[serde(rename = "inversiones")]
    Investments,
    #[serde(rename = "otros")]
    Other,
}

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Business => "Negocio",
            ExpenseCategory::Purchases => "Compras/Fletes",
            ExpenseCategory::Personal => "Personal",
            ExpenseCategory::Investments => "Inversiones",
            ExpenseCategory::Other => "Otros",
        }
    }

    pub fn is_operating(&self) -> bool {
        matches!(
            self,
            ExpenseCategory::Business | ExpenseCategory::Purchases | ExpenseCategory::Investments
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "closed")]
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommitmentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
}

impl CommitmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitmentStatus::Pending => "pending",
            CommitmentStatus::Paid => "paid",
        }
    }
}

pub const ORG_SETTINGS_VERSION: i32 = 2;

/// Versioned per-organization settings. Missing fields take their defaults at
/// deserialization time, so older stored documents read cleanly; `migrate`
/// stamps the current version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrgSettings {
    #[serde(default = "OrgSettings::default_version")]
    pub version: i32,
    /// Commission percentage charged on QR sales.
    #[serde(default)]
    pub commission_qr: f64,
    /// Commission percentage charged on debit-card sales.
    #[serde(default)]
    pub commission_debit: f64,
    /// Commission percentage charged on credit-card sales.
    #[serde(default)]
    pub commission_credit: f64,
    #[serde(default = "OrgSettings::default_low_stock_alerts")]
    pub low_stock_alerts: bool,
}

impl OrgSettings {
    fn default_version() -> i32 {
        ORG_SETTINGS_VERSION
    }

    fn default_low_stock_alerts() -> bool {
        true
    }

    pub fn migrate(mut self) -> Self {
        self.version = ORG_SETTINGS_VERSION;
        self
    }

    /// Commission fee for a sale: percentage of the amount for card-like
    /// methods, zero otherwise.
    pub fn commission_for(&self, method: PaymentMethod, amount: f64) -> f64 {
        let rate = match method {
            PaymentMethod::Qr => self.commission_qr,
            PaymentMethod::Debit => self.commission_debit,
            PaymentMethod::Credit => self.commission_credit,
            PaymentMethod::Cash | PaymentMethod::Transfer => 0.0,
        };
        amount * rate / 100.0
    }
}

impl Default for OrgSettings {
    fn default() -> Self {
        OrgSettings {
            version: ORG_SETTINGS_VERSION,
            commission_qr: 0.0,
            commission_debit: 0.0,
            commission_credit: 0.0,
            low_stock_alerts: true,
        }
    }
}

/// Organization (tenant) document. All transactional and catalog data is
/// partitioned by its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub settings: OrgSettings,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub notes: Option<String>,
}

/// User document. Organization access lives in `UserOrganization` rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub secret: String,
}

/// Membership row linking a user to an organization with a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOrganization {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub org_id: ObjectId,
    pub role: UserRole,
}

/// Session document linking a token to a user and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub user_email: String,
    pub expires_at: DateTime,
}

/// Sale line item embedded in a cash session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub entry_id: ObjectId,
    pub amount: f64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub is_credit: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub at: DateTime,
}

/// Extra income line item (besides opening balances) embedded in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub entry_id: ObjectId,
    pub description: String,
    pub amount: f64,
    pub at: DateTime,
}

/// Expense line item embedded in a session. The provider name is denormalized
/// so archived audits stay readable after a provider is deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub entry_id: ObjectId,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub provider_id: Option<ObjectId>,
    #[serde(default)]
    pub provider_name: Option<String>,
    pub at: DateTime,
}

/// The working record of one tenant's business day. Mutated only through
/// field-level patches ($push/$inc/$set); `version` grows with every write so
/// concurrent writers commute and lost updates are detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    /// Day key, pinned to midnight UTC.
    pub date: DateTime,
    pub status: SessionStatus,
    pub opening_cash: f64,
    pub opening_digital: f64,
    #[serde(default)]
    pub incomes: Vec<IncomeEntry>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub expenses: Vec<ExpenseEntry>,
    /// Running commission total, incremented alongside each sale.
    #[serde(default)]
    pub commissions_total: f64,
    pub physical_cash: Option<f64>,
    pub physical_digital: Option<f64>,
    pub difference: Option<f64>,
    pub notes: Option<String>,
    pub report_url: Option<String>,
    #[serde(default)]
    pub version: i64,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub closed_at: Option<DateTime>,
}

/// Immutable archival snapshot written when a session closes. Only the report
/// URL (after regeneration) and date/notes (explicit edit) are ever patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAudit {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub date: DateTime,
    pub session: CashSession,
    pub total_sales: f64,
    pub difference: f64,
    pub report_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime>,
}

/// Catalog product with margin-derived pricing and stock thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub name: String,
    pub cost: f64,
    pub margin_pct: f64,
    pub suggested_price: f64,
    pub final_price: f64,
    pub stock: f64,
    pub min_stock: f64,
    #[serde(default)]
    pub last_cost: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Consumable supply tracked by cost and stock only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supply {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub name: String,
    pub cost: f64,
    pub unit: String,
    pub stock: f64,
    pub min_stock: f64,
    #[serde(default)]
    pub last_cost: Option<f64>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceField {
    #[serde(rename = "cost")]
    Cost,
    #[serde(rename = "price")]
    Price,
}

/// Append-only price-change log. One row per product field whose value moved
/// by more than 0.01 absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPrice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub product_id: ObjectId,
    pub field: PriceField,
    pub old_value: f64,
    pub new_value: f64,
    pub recorded_at: DateTime,
}

/// Provider contact record with a soft-delete lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Scheduled outbound payment obligation. PENDING → PAID exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub description: String,
    pub amount: f64,
    pub due_date: DateTime,
    #[serde(default)]
    pub provider_id: Option<ObjectId>,
    pub status: CommitmentStatus,
    pub paid_at: Option<DateTime>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Append-only loss-tracking entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WastageRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub product_name: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub reason: String,
    pub date: DateTime,
    pub created_at: Option<DateTime>,
}

/// Stored blob (generated reports, uploaded logos) keyed by filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub filename: String,
    pub content_type: String,
    pub data: Binary,
    pub uploaded_at: DateTime,
}
