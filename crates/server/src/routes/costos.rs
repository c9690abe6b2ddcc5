//! `/api/costos`: cost evolution and the regional CMM comparison. An empty
//! result is a successful, empty answer here.

use super::{ApiRouter, Catalog};
use sgi::{Aggregate, ParamSpec, Route};

pub fn evolucion() -> Route {
    // Left unbound when absent so the procedure picks the latest year.
    Route::new("/evolucionCostos", "sp_ObtenerEvolucionCostos")
        .params([ParamSpec::int("ano", "Ano")
            .or_omit()
            .strict("El parámetro año debe ser un número válido")])
        .extra("years", Aggregate::Distinct("Ano"))
        .empty_ok("No se encontraron datos para los años solicitados")
        .failure("Error al obtener la evolución de costos")
}

pub fn comparativo() -> Route {
    Route::new("/comparativoCMM", "sp_ComparativoCMMRegional")
        .empty_ok("No se encontraron datos")
        .failure("Error al obtener el comparativo CMM")
}

pub fn router() -> ApiRouter {
    ApiRouter::new()
        .get_route(evolucion())
        .get_route(comparativo())
}
