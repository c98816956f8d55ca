pub mod create;
pub mod delete;
pub mod refresh;

pub use create::{CreateCountryCommand, CreateCountryError};
pub use delete::{DeleteCountryCommand, DeleteCountryError};
pub use refresh::{RefreshCountriesCommand, RefreshCountriesResponse};
