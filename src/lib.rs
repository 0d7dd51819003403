pub mod error;
pub mod modem_modules;
pub mod version;

pub use error::PollError;
pub use modem_modules::fields::{ChannelVector, decode_fields};
pub use modem_modules::report::{
    ReportFormat, RowSpec, Section, default_sections, render, render_json, render_report,
};
pub use modem_modules::session::ModemSession;
pub use modem_modules::status::{StatusTable, read_saved_page, scrape_status};
pub use version::VERSION;
