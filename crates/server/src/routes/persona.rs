//! `/api/persona`: staff indicators. Every validation failure reports the
//! same message.

use super::{ApiRouter, Catalog};
use sgi::{ParamSpec, Route};

const INVALIDOS: &str = "Los parámetros proporcionados no son válidos";

fn optional(key: &'static str) -> ParamSpec {
    ParamSpec::int(key, key).or_null().strict(INVALIDOS)
}

fn required(key: &'static str) -> ParamSpec {
    ParamSpec::int(key, key).required(INVALIDOS).strict(INVALIDOS)
}

fn region_persona() -> ParamSpec {
    ParamSpec::int("CodigoRegionPersona", "CodigoRegionPersona").or_null()
}

pub fn routes() -> Vec<Route> {
    vec![
        Route::new("/indicadoresRegion", "SP_Per_ObtenerIndicadoresRegion").params([
            optional("CodigoRegion"),
            optional("Mes"),
            optional("Ano"),
        ]),
        Route::new("/compararIndicadores", "sp_per_CompararIndicadores")
            .params([required("MesActual"), required("AnoActual")]),
        Route::new("/tendenciaIndicadores", "sp_per_TendenciaIndicadores")
            .params([required("Ano"), required("CodigoRegionPersona")]),
        Route::new("/objetivoVsActual", "sp_per_ObjetivoVsActual")
            .params([required("Ano"), region_persona()]),
        Route::new("/semaforoIndicadores", "sp_per_SemaforoIndicadores")
            .params([optional("Ano"), region_persona()]),
    ]
}

pub fn router() -> ApiRouter {
    routes()
        .into_iter()
        .fold(ApiRouter::new(), |router, route| router.get_route(route))
}
