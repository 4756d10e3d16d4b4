//! Presentation-side components: the booking flow and the admin tools.
//!
//! They hold view state and talk to the REST contract only through
//! [`BookingApi`], so the same components run over HTTP
//! ([`HttpBookingApi`]) or in-process behind the server-rendered pages
//! ([`LocalBookingApi`]).

pub mod api;
pub mod blocked;
pub mod catalog;
pub mod dashboard;
pub mod directory;
pub mod http;
pub mod local;
pub mod notice;
pub mod resolver;
pub mod session;
pub mod wizard;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{ApiError, BookingApi};
pub use blocked::BlockedSlotManager;
pub use catalog::CatalogLoader;
pub use dashboard::AdminDashboard;
pub use directory::CustomerDirectory;
pub use http::HttpBookingApi;
pub use local::LocalBookingApi;
pub use notice::{Notice, NoticeLevel, Notices};
pub use resolver::{AvailabilityResolver, SlotList};
pub use session::{AdminSession, MemoryTokenStore, TokenStore};
pub use wizard::{BackTo, BookingWizard, ContactInfo, Confirmation, WizardError, WizardStep};
