pub(crate) mod cash;
pub(crate) mod commitments;
pub(crate) mod files;
mod helpers;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod monthly;
pub(crate) mod orgs;
pub(crate) mod products;
pub(crate) mod providers;
pub(crate) mod qrcode;
pub(crate) mod setup;
pub(crate) mod supplies;
pub(crate) mod wastage;

pub use cash::{
    audits_delete, audits_index, audits_regenerate_report, audits_show, audits_update,
    expenses_create, incomes_create, sales_create, session_close, session_open,
    session_opening_update, session_show,
};
pub use commitments::{
    commitments_create, commitments_delete, commitments_index, commitments_pay,
    commitments_update,
};
pub use files::{logo_download, report_download};
pub use login::login;
pub use logout::logout;
pub use monthly::monthly_stats;
pub use orgs::{
    logo_upload, me_orgs, org_show, org_switch, org_update, orgs_create, settings_show,
    settings_update,
};
pub use products::{
    products_create, products_delete, products_history, products_index, products_show,
    products_update,
};
pub use providers::{providers_create, providers_delete, providers_index, providers_update};
pub use qrcode::qrcode;
pub use setup::setup;
pub use supplies::{supplies_create, supplies_delete, supplies_index, supplies_update};
pub use wastage::{wastage_create, wastage_delete, wastage_index};
