//! `/api/regiones`: the region list behind every region selector.

use super::{ApiRouter, Catalog};
use sgi::Route;

pub fn route() -> Route {
    Route::new("/tbRegion", "sp_ObtenerRegiones")
        .counted()
        .not_found("No se encontraron regiones")
}

pub fn router() -> ApiRouter {
    ApiRouter::new().get_route(route())
}
