//! `/api/presupuesto`: budget execution. Filters arrive in a JSON body.

use super::{ApiRouter, Catalog};
use sgi::{ParamSpec, Route, Shape};

const ANO_OBLIGATORIO: &str = "El parámetro \"Ano\" es obligatorio.";

fn ano() -> ParamSpec {
    ParamSpec::int("Ano", "Ano").required(ANO_OBLIGATORIO)
}

fn rubros() -> [ParamSpec; 2] {
    [
        ParamSpec::text("Rubro", "Rubro", 30),
        ParamSpec::text("SubRubro", "SubRubro", 30),
    ]
}

/// `Ano`, `NombreDireccion`, `Rubro`, `SubRubro`.
fn filters() -> Vec<ParamSpec> {
    let mut specs = vec![ano(), ParamSpec::text("NombreDireccion", "NombreDireccion", 50)];
    specs.extend(rubros());
    specs
}

fn listing(path: &'static str, procedure: &'static str) -> Route {
    Route::new(path, procedure).params(filters()).counted()
}

pub fn routes() -> Vec<Route> {
    let mut tarjetas = filters();
    tarjetas.push(ParamSpec::text("CodigoCentroGestor", "CodigoCentroGestor", 20));

    let mut vigente = vec![ano(), ParamSpec::text("CodigoDireccion", "CodigoDireccion", 4)];
    vigente.extend(rubros());

    vec![
        Route::new(
            "/obtenerDatosTarjetas",
            "sp_ObtenerDatosTarjetasConCentroGestor",
        )
        .params(tarjetas)
        .counted(),
        Route::new("/obtenerFlujoSaldo", "sp_ObtenerFlujoSaldoPorEjecutar")
            .params(filters())
            .data(Shape::FirstRow),
        listing(
            "/obtenerGastosVsSaldo",
            "sp_ObtenerGastosEjecutadosVsSaldoPorGastar",
        ),
        listing(
            "/obtenerPorcentajeEjecucionVsSaldo",
            "sp_ObtenerPorcentajeEjecucionVsSaldo",
        ),
        Route::new(
            "/obtenerPresupuestoComprometidoVsEjecutado",
            "sp_ObtenerPresupuestoComprometidoVsEjecutado",
        )
        .params(filters()),
        listing(
            "/obtenerPresupuestoVsEjecutado",
            "sp_ObtenerPresupuestoVsEjecutado",
        ),
        listing("/obtenerPresupuestoVsGastos", "sp_ObtenerPresupuestoVsGastos"),
        Route::new(
            "/presupuestoVigenteVsEjecutado",
            "sp_PresupuestoVigenteVsEjecutado",
        )
        .params(vigente)
        .counted(),
    ]
}

/// Execution years, the one parameterless GET of the group.
pub fn years() -> Route {
    Route::new(
        "/obtenerAniosEjecucion",
        "sp_ObtenerAniosEjecucionPresupuestaria",
    )
    .counted()
}

pub fn router() -> ApiRouter {
    routes()
        .into_iter()
        .fold(ApiRouter::new(), |router, route| router.post_route(route))
        .get_route(years())
}
