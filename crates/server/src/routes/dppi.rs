//! `/api/dppi`: kindergarten counts, indigenous and migrant children,
//! official recognition (RO) and green seal figures.

use super::{ApiRouter, Catalog};
use sgi::{Aggregate, Field, GroupRatio, Member, ParamSpec, Precision, Route, Shape, Summary};

const REGION_INVALIDA: &str = "El código de región debe ser un número válido";
const ANO_REQUERIDO: &str = "El año es requerido";

fn region() -> ParamSpec {
    ParamSpec::int("codigoRegion", "CodigoRegion")
        .or_zero()
        .strict(REGION_INVALIDA)
}

fn lenient_region() -> ParamSpec {
    ParamSpec::int("codigoRegion", "CodigoRegion").or_zero()
}

fn jardin() -> ParamSpec {
    ParamSpec::int("codigoJardin", "CodigoJardin").or_zero()
}

pub fn routes() -> Vec<Route> {
    vec![
        Route::new("/conteoJardines", "sp_ContarJardinesPorRegion")
            .params([region()])
            .data(Shape::each(&[
                ("region", "Region"),
                ("totalJardines", "TotalJardines"),
            ]))
            .counted()
            .summary(Summary::new([(
                "totalGeneral",
                Aggregate::Sum("TotalJardines"),
            )]))
            .echo_params(),
        Route::new("/totalNinosOriginarios", "sp_ObtenerTotalNinosOriginarios")
            .params([ParamSpec::int("ano", "Ano").or_null(), region()])
            .data(Shape::first(&[(
                "totalNinosOriginarios",
                "TotalNinosOriginarios",
            )]))
            .echo_params(),
        Route::new("/totalNinosMigrantes", "sp_ObtenerTotalNinosMigrantes")
            .params([
                ParamSpec::int("ano", "Ano").required(ANO_REQUERIDO),
                lenient_region(),
            ])
            .data(Shape::object([
                Member::new(
                    "totales",
                    Shape::first(&[
                        ("totalNinosMigrantes", "TotalNinosMigrantes"),
                        ("totalJardinesConMigrantes", "TotalJardinesConMigrantes"),
                    ]),
                ),
                Member::new(
                    "detallePorNacionalidad",
                    Shape::each(&[
                        ("nacionalidad", "NacionalidadPO"),
                        ("totalNinos", "TotalNinos"),
                    ]),
                )
                .from_set(1),
            ]))
            .count_set(1)
            .echo_params(),
        Route::new("/totalJardinesRO", "sp_ObtenerTotalJardinesRO")
            .params([
                ParamSpec::int("anoRO", "AnoRO").required(ANO_REQUERIDO),
                lenient_region(),
            ])
            .data(Shape::first(&[
                ("totalJardinesConRO", "TotalJardinesConRO"),
                ("totalJardinesROIntegra", "TotalJardinesROIntegra"),
                ("totalJardinesROSdEP", "TotalJardinesROSdEP"),
                ("totalJardines", "TotalJardines"),
            ]))
            .echo_params(),
        Route::new("/totalJardinesSelloVerde", "sp_ObtenerTotalJardinesSelloVerde")
            .params([
                ParamSpec::int("anoSV", "AnoSV").required(ANO_REQUERIDO),
                lenient_region(),
            ])
            .data(Shape::first(&[
                ("totalJardinesVigentes", "TotalJardinesVigentes"),
                ("totalJardinesCerrados", "TotalJardinesCerrados"),
                ("totalJardines", "TotalJardines"),
            ]))
            .echo_params(),
        Route::new(
            "/frecuenciaPueblosOriginarios",
            "sp_ObtenerFrecuenciaPueblosOriginarios",
        )
        .params([region(), jardin(), ParamSpec::int("ano", "Ano").or_zero()])
        .data(Shape::each(&[
            ("region", "Region"),
            ("nombreRegion", "NombreRegion"),
            ("provincia", "Provincia"),
            ("comuna", "Comuna"),
            ("frecuencia", "Frecuencia"),
        ]))
        .counted()
        .summary(Summary::new([(
            "totalFrecuencia",
            Aggregate::Sum("Frecuencia"),
        )]))
        .echo_params(),
        Route::new("/estadisticasRO", "sp_ObtenerEstadisticasRO")
            .params([
                ParamSpec::int("ano", "AnoRO")
                    .required(ANO_REQUERIDO)
                    .echo_as("anoRO"),
                region(),
                jardin(),
            ])
            .data(Shape::object([
                Member::new(
                    "estadisticas",
                    Shape::Rollup {
                        key: "TipoEstablecimiento",
                        label: "tipoEstablecimiento",
                        sums: vec![
                            Field::new("totalJardines", "TotalJardines"),
                            Field::new("conReconocimiento", "ConReconocimiento"),
                        ],
                        ratio: Some(GroupRatio {
                            name: "porcentaje",
                            part: "conReconocimiento",
                            total: "totalJardines",
                            precision: Precision::Whole,
                        }),
                    },
                ),
                Member::new(
                    "detalleJardines",
                    Shape::each(&[
                        ("region", "NombreRegion"),
                        ("codigoJardin", "CodigoJardin"),
                        ("nombreJardin", "NombreJardin"),
                        ("tipoEstablecimiento", "TipoEstablecimiento"),
                        ("comuna", "Comuna"),
                        ("provincia", "Provincia"),
                        ("estadoRO", "EstadoRO"),
                        ("fechaRO", "FechaRO"),
                        ("tienePlacaROIntegra", "TienePlacaROIntegra"),
                        ("tienePlacaSdEP", "TienePlacaSdEP"),
                    ]),
                ),
            ]))
            .echo_params()
            .not_found("No se encontraron datos para los parámetros proporcionados")
            .failure("Error interno del servidor"),
    ]
}

pub fn router() -> ApiRouter {
    routes()
        .into_iter()
        .fold(ApiRouter::new(), |router, route| router.get_route(route))
}
