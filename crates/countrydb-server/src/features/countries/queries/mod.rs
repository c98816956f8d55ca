pub mod get;
pub mod image;
pub mod list;
pub mod status;

pub use get::{GetCountryError, GetCountryQuery};
pub use image::{GetSummaryImageError, GetSummaryImageQuery};
pub use list::{ListCountriesError, ListCountriesQuery};
pub use status::{GetStatusQuery, StatusError, StatusResponse};
