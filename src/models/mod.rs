pub mod location;
pub mod sensor;
pub mod summary;
pub mod visitor;

pub use location::{CreateLocationRequest, Location};
pub use sensor::{CreateSensorRequest, Sensor, SensorProjection, SensorStatus};
pub use summary::{SensorStats, Summary};
pub use visitor::{CreateVisitorRequest, VisitorRecord};
