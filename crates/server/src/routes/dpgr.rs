//! `/api/dpgr`: accidents, nutrition, family surveys, nationality and
//! indigenous population breakdowns. Every numeric filter falls back to
//! `null`; a malformed region code is a 400.

use super::{ApiRouter, Catalog};
use sgi::{Aggregate, Field, Member, Nested, Operand, ParamSpec, Precision, Route, Shape};

const REGION_INVALIDA: &str = "El código de región debe ser un número válido";

fn ano() -> ParamSpec {
    ParamSpec::int("ano", "Ano")
}

fn anio() -> ParamSpec {
    ParamSpec::int("anio", "Anio")
}

fn region() -> ParamSpec {
    ParamSpec::int("codigoRegion", "CodigoRegion").strict(REGION_INVALIDA)
}

fn jardin() -> ParamSpec {
    ParamSpec::int("codigoJardin", "CodigoJardin")
}

fn report(path: &'static str, procedure: &'static str) -> Route {
    Route::new(path, procedure).echo_params()
}

pub fn routes() -> Vec<Route> {
    vec![
        report("/totalAccidentes", "sp_ObtenerTotalAccidentes")
            .params([ano(), region(), jardin()])
            .data(Shape::object([
                Member::new("detalleAccidentes", Shape::Rows),
                Member::new("resumen", Shape::FirstRow).from_set(1),
            ])),
        report(
            "/totalesDiagnosticoNutricional",
            "sp_ObtenerTotalesDiagnosticoNutricional",
        )
        .params([ano(), region(), jardin()])
        .data(Shape::object([
            Member::new("totalEvaluados", Shape::column("TotalNinosEvaluados")),
            Member::new(
                "diagnosticos",
                Shape::first(&[
                    ("normal", "NinosNormal"),
                    ("obesidad", "NinosObesidad"),
                    ("sobrepeso", "NinosSobrepeso"),
                    ("deficit", "NinosDeficit"),
                ]),
            ),
        ])),
        report(
            "/informacionClaraOportuna",
            "sp_ObtenerInformacionClaraOportuna",
        )
        .params([anio(), region()])
        .data(Shape::object([
            Member::new("totalEncuestados", Shape::column("TotalEncuestados")),
            Member::new("deAcuerdo", Shape::column("DeAcuerdo")),
            Member::new("enDesacuerdo", Shape::column("EnDesacuerdo")),
            Member::new(
                "porcentajes",
                Shape::first(&[
                    ("acuerdo", "PorcentajeAcuerdo"),
                    ("desacuerdo", "PorcentajeDesacuerdo"),
                ]),
            ),
        ])),
        report("/informacionGeografica", "sp_ObtenerInformacionGeografica")
            .params([anio(), region()])
            .data(Shape::each(&[
                ("nombreRegion", "NombreRegion"),
                ("totalEncuestados", "TotalEncuestados"),
                ("deAcuerdo", "DeAcuerdo"),
                ("enDesacuerdo", "EnDesacuerdo"),
            ])),
        report("/graficoSelloVerde", "sp_ObtenerSelloVerdeGrafico")
            .params([ParamSpec::int("anoSV", "AnoSV"), region(), jardin()])
            .data(Shape::each(&[
                ("año", "Año"),
                ("totalSellos", "TotalSellos"),
                ("totalJardines", "TotalJardines"),
                ("porcentaje", "Porcentaje"),
            ])),
        report(
            "/porcentajeNacionalidadExtranjera",
            "sp_ObtenerPorcentajeNacionalidadExtranjera",
        )
        .params([ano(), region(), jardin()])
        .data(Shape::object([
            Member::new(
                "detalleNacionalidades",
                Shape::each(&[
                    ("nacionalidad", "NacionalidadPO"),
                    ("total", "TotalPorNacionalidad"),
                    ("porcentaje", "Porcentaje"),
                ]),
            ),
            Member::new(
                "resumen",
                Shape::object([
                    Member::new("totalGeneral", Shape::column("TotalGeneral")),
                    Member::new(
                        "totalExtranjeros",
                        Shape::Aggregate(Aggregate::Sum("TotalPorNacionalidad")),
                    ),
                    Member::new(
                        "porcentajeExtranjeros",
                        Shape::Aggregate(Aggregate::Percentage {
                            part: Operand::Sum("TotalPorNacionalidad"),
                            total: Operand::First("TotalGeneral"),
                            precision: Precision::FixedText(2),
                        }),
                    ),
                ]),
            ),
        ])),
        report(
            "/porcentajePueblosOriginarios",
            "sp_ObtenerPorcentajePueblosOriginarios",
        )
        .params([ano(), region()])
        .data(Shape::object([
            Member::new(
                "detallePueblos",
                Shape::each(&[
                    ("pueblo", "Pueblo"),
                    ("total", "Total"),
                    ("porcentaje", "Porcentaje"),
                ]),
            ),
            Member::new("totalGeneral", Shape::column("TotalGeneral")),
        ])),
        report("/nacionalidadPorGeografia", "sp_ObtenerNacionalidadPorGeografia")
            .params([ano(), region()])
            .data(Shape::GroupBy {
                key: "Comuna",
                fields: vec![
                    Field::new("nombreRegion", "NombreRegion"),
                    Field::new("direccionRegional", "DireccionRegional"),
                ],
                nested: vec![Nested {
                    name: "nacionalidades",
                    key: "NacionalidadPO",
                    value: "Total",
                }],
            }),
    ]
}

pub fn router() -> ApiRouter {
    routes()
        .into_iter()
        .fold(ApiRouter::new(), |router, route| router.get_route(route))
}
