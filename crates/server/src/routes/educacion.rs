//! `/api/educacion`: special-needs, permanence, lag and satisfaction
//! indicators. Every route takes `ano` and an optional `codigoRegion`.

use super::{ApiRouter, Catalog};
use sgi::{Aggregate, Condition, ParamSpec, Route, Shape, Summary};

const ANO_REQUERIDO: &str = "El parámetro año es requerido";
const ANO_INVALIDO: &str = "El parámetro año debe ser un número válido";

fn region() -> ParamSpec {
    ParamSpec::int("codigoRegion", "CodigoRegion").or_zero()
}

fn params() -> [ParamSpec; 2] {
    [
        region(),
        ParamSpec::int("ano", "Ano")
            .required(ANO_REQUERIDO)
            .strict(ANO_INVALIDO),
    ]
}

fn listing(path: &'static str, procedure: &'static str) -> Route {
    Route::new(path, procedure).params(params()).counted()
}

pub fn routes() -> Vec<Route> {
    vec![
        listing("/necesidades", "sp_EducacionObtenerNecesidades").summary(Summary::new([
            ("cantidadTotal", Aggregate::Sum("Cantidad")),
            (
                "necesidadesPorCategoria",
                Aggregate::SumBy {
                    key: "CategoriaNEE",
                    value: "Cantidad",
                },
            ),
        ])),
        listing(
            "/necesidades/comuna",
            "sp_EducacionObtenerNecesidadesPorComuna",
        ),
        listing(
            "/porcentajePermanente",
            "sp_EducacionObtenerPorcentajePermanente",
        ),
        listing("/graficoNEE", "sp_EducacionGenerarDatosGraficoNEE"),
        listing("/porcentajeRezago", "sp_EducacionObtenerPorcentajeRezago"),
        listing("/porcentajeATET", "sp_GenerarGraficoATET"),
        Route::new("/promedioSatisfaccion", "sp_ObtenerPromedioSatisfaccionATT")
            .params(params())
            .data(Shape::first(&[("promedioSatisfaccion", "PromedioSatisfaccion")])),
        Route::new("/cantidadTotal", "sp_EducacionObtenerCantidadTotal")
            .params(params())
            .data(Shape::first(&[("cantidadTotal", "CantidadTotal")])),
        // The national average only makes sense across every region.
        Route::new("/satisfaccionGeografica", "sp_ObtenerSatisfaccionGeografica")
            .params([
                ParamSpec::int("ano", "Ano").or_current_year(),
                region(),
            ])
            .data(Shape::each(&[
                ("region", "Region"),
                ("promedioSatisfaccion", "PromedioSatisfaccion"),
                ("totalJardines", "TotalJardines"),
            ]))
            .counted()
            .summary(
                Summary::new([(
                    "promedioNacional",
                    Aggregate::WeightedAverage {
                        value: "PromedioSatisfaccion",
                        weight: "TotalJardines",
                        decimals: 1,
                    },
                )])
                .when(Condition::Unfiltered("codigoRegion")),
            )
            .echo_params(),
    ]
}

pub fn router() -> ApiRouter {
    routes()
        .into_iter()
        .fold(ApiRouter::new(), |router, route| router.get_route(route))
}
