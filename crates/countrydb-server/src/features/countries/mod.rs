pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateCountryCommand, CreateCountryError, DeleteCountryCommand, DeleteCountryError,
    RefreshCountriesCommand, RefreshCountriesResponse,
};

pub use queries::{
    GetCountryError, GetCountryQuery, GetStatusQuery, GetSummaryImageError, GetSummaryImageQuery,
    ListCountriesError, ListCountriesQuery, StatusError, StatusResponse,
};

pub use routes::countries_routes;
