//! `/api/parametros`: lookup lists for the budget filters.

use super::{ApiRouter, Catalog};
use sgi::{ParamSpec, Route};

const SIN_DATOS: &str = "No se encontraron datos disponibles";

pub fn direcciones() -> Route {
    Route::new("/obtenerDirecciones", "sp_ObtenerDirecciones")
        .params([
            ParamSpec::int("CodigoDireccion", "CodigoDireccion")
                .numbers_only()
                .strict("El parámetro \"CodigoDireccion\" debe ser un número."),
            ParamSpec::text("TipoDireccion", "TipoDireccion", 50)
                .strict("El parámetro \"TipoDireccion\" debe ser un texto."),
        ])
        .counted()
        .not_found(SIN_DATOS)
}

pub fn sub_rubros() -> Route {
    Route::new("/obtenerSubRubros", "sp_ObtenerSubRubros")
        .params([ParamSpec::text("Rubro", "Rubro", 30)
            .required("El parámetro \"Rubro\" es obligatorio.")])
        .counted()
        .not_found(SIN_DATOS)
}

pub fn rubros() -> Route {
    Route::new("/obtenerTodosLosRubros", "sp_ObtenerTodosLosRubros")
        .counted()
        .not_found(SIN_DATOS)
}

pub fn router() -> ApiRouter {
    ApiRouter::new()
        .post_route(direcciones())
        .post_route(sub_rubros())
        .get_route(rubros())
}
