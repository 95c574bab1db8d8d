//! Service layer
//!
//! Services sit between the web handlers and the repositories. The sensor,
//! visitor and summary services own the caching policy; the location service
//! has none.

pub mod location;
pub mod sensor;
pub mod summary;
pub mod visitor;

pub use location::LocationService;
pub use sensor::{SensorQuery, SensorService};
pub use summary::SummaryService;
pub use visitor::{decide, AccessState, FetchPath, VisitorService};
