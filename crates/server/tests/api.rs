//! HTTP round-trips through the full router against a scripted invoker.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{Environment, ServerConfig, ServerState, build_router};
use sgi::{DB_ERROR, InvokeError, NO_DATA, ResultSet, Row, ScriptedInvoker, SqlValue};
use tower::ServiceExt;

fn create_app(invoker: ScriptedInvoker, environment: Environment) -> (Router, Arc<ScriptedInvoker>) {
    let config = ServerConfig {
        environment,
        retry_delay_ms: 0,
        ..ServerConfig::default()
    };
    let invoker = Arc::new(invoker);
    let state = ServerState::new(config, invoker.clone());
    (build_router(Arc::new(state)), invoker)
}

fn production(invoker: ScriptedInvoker) -> (Router, Arc<ScriptedInvoker>) {
    create_app(invoker, Environment::Production)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn set(rows: Vec<Row>) -> ResultSet {
    ResultSet::new(rows)
}

#[tokio::test]
async fn test_strict_region_rejected_without_invocation() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/dppi/conteoJardines?codigoRegion=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["message"],
        json!("El código de región debe ser un número válido")
    );
    assert!(body.get("data").is_none());
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_missing_required_year_skips_invocation() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/dppi/totalNinosMigrantes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("El año es requerido"));
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_two_result_sets_feed_named_slots() {
    let totales = set(vec![
        Row::new()
            .with("TotalNinosMigrantes", 12)
            .with("TotalJardinesConMigrantes", 3),
    ]);
    let detalle = set(vec![
        Row::new().with("NacionalidadPO", "Venezolana").with("TotalNinos", 6),
        Row::new().with("NacionalidadPO", "Peruana").with("TotalNinos", 4),
        Row::new().with("NacionalidadPO", "Haitiana").with("TotalNinos", 2),
    ]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![totales, detalle]));
    let (status, body) = get(app, "/api/dppi/totalNinosMigrantes?ano=2024").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["data"]["totales"]["totalNinosMigrantes"], json!(12));
    assert_eq!(
        body["data"]["detallePorNacionalidad"][0],
        json!({"nacionalidad": "Venezolana", "totalNinos": 6})
    );
    assert_eq!(body["params"], json!({"ano": 2024, "codigoRegion": 0}));
    assert_eq!(invoker.call_count(), 1);
}

#[tokio::test]
async fn test_login_rejects_string_rut() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = post(
        app,
        "/api/login",
        r#"{"CorreoElectronico":"ana@example.cl","RUT":"12345678"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("El parámetro \"RUT\" debe ser un número."));
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_login_missing_fields() {
    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = post(app, "/api/login", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("Los parámetros \"CorreoElectronico\" y \"RUT\" son obligatorios.")
    );
}

#[tokio::test]
async fn test_login_outcomes() {
    let login = r#"{"CorreoElectronico":"ana@example.cl","RUT":12345678}"#;

    let wrong_key = set(vec![Row::new().with("Mensaje", "Clave incorrecta")]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![wrong_key]));
    let (status, body) = post(app, "/api/login", login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Clave incorrecta"));
    let call = &invoker.calls()[0];
    assert_eq!(call.params[1].value, SqlValue::BigInt(Some(12_345_678)));

    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = post(app, "/api/login", login).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Usuario no encontrado"));

    let user = set(vec![
        Row::new()
            .with("Nombre", "Ana")
            .with("Mensaje", "Login exitoso"),
    ]);
    let (app, _) = production(ScriptedInvoker::returning(vec![user]));
    let (status, body) = post(app, "/api/login", login).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["Nombre"], json!("Ana"));
}

#[tokio::test]
async fn test_empty_result_is_not_found() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/educacion/necesidades?ano=2024").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!(NO_DATA));
    assert_eq!(invoker.call_count(), 1);
}

#[tokio::test]
async fn test_expired_credential_retried_once() {
    let rows = set(vec![Row::new().with("IdRegion", 1).with("NombreRegion", "Tarapacá")]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![rows]).failing_auth(1));
    let (status, body) = get(app, "/api/regiones/tbRegion").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(invoker.call_count(), 2);
    assert_eq!(invoker.refresh_count(), 1);
}

#[tokio::test]
async fn test_second_auth_failure_is_terminal() {
    let (app, invoker) = production(ScriptedInvoker::new().failing_auth(2));
    let (status, body) = get(app, "/api/regiones/tbRegion").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!(DB_ERROR));
    assert!(body.get("error").is_none());
    assert_eq!(invoker.call_count(), 2);
    assert_eq!(invoker.refresh_count(), 1);
}

#[tokio::test]
async fn test_zero_region_binds_like_absent_region() {
    let rows = || set(vec![Row::new().with("CategoriaNEE", "TEA").with("Cantidad", 4)]);

    let (app, explicit) = production(ScriptedInvoker::returning(vec![rows()]));
    let (_, with_zero) = get(app, "/api/educacion/necesidades?ano=2024&codigoRegion=0").await;

    let (app, implicit) = production(ScriptedInvoker::returning(vec![rows()]));
    let (_, without) = get(app, "/api/educacion/necesidades?ano=2024").await;

    assert_eq!(explicit.calls()[0].params, implicit.calls()[0].params);
    assert_eq!(with_zero, without);
}

#[tokio::test]
async fn test_repeated_request_is_identical() {
    let rows = set(vec![
        Row::new().with("CategoriaNEE", "TEA").with("Cantidad", 4),
        Row::new().with("CategoriaNEE", "TDAH").with("Cantidad", 2),
        Row::new().with("CategoriaNEE", "TEA").with("Cantidad", 1),
    ]);
    let (app, _) = production(ScriptedInvoker::returning(vec![rows]));

    let (first_status, first) = get(app.clone(), "/api/educacion/necesidades?ano=2024").await;
    let (second_status, second) = get(app, "/api/educacion/necesidades?ano=2024").await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first_status, second_status);
    assert_eq!(first, second);
    assert_eq!(
        first["summary"],
        json!({"cantidadTotal": 7, "necesidadesPorCategoria": {"TEA": 5, "TDAH": 2}})
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/nada").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Ruta no encontrada: GET /api/nada"));
}

#[tokio::test]
async fn test_error_detail_only_in_development() {
    let (app, _) = create_app(
        ScriptedInvoker::failing("Could not find stored procedure"),
        Environment::Development,
    );
    let (status, body) = get(app, "/api/regiones/tbRegion").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!(DB_ERROR));
    assert_eq!(body["error"], json!("Could not find stored procedure"));

    let (app, _) = production(ScriptedInvoker::failing("Could not find stored procedure"));
    let (_, body) = get(app, "/api/regiones/tbRegion").await;
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_cost_evolution_empty_is_ok() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/costos/evolucionCostos").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "data": [],
            "message": "No se encontraron datos para los años solicitados"
        })
    );
    // No year given: nothing is bound.
    assert!(invoker.calls()[0].params.is_empty());
}

#[tokio::test]
async fn test_cost_evolution_years() {
    let rows = set(vec![
        Row::new().with("Ano", 2023).with("Costo", 10.5),
        Row::new().with("Ano", 2024).with("Costo", 11.0),
        Row::new().with("Ano", 2023).with("Costo", 3.5),
    ]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![rows]));
    let (status, body) = get(app, "/api/costos/evolucionCostos?ano=2023").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["years"], json!([2023, 2024]));
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
    assert_eq!(invoker.calls()[0].params.len(), 1);
}

#[tokio::test]
async fn test_cost_evolution_failure_message() {
    let (app, _) = production(ScriptedInvoker::failing("timeout"));
    let (status, body) = get(app, "/api/costos/evolucionCostos").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Error al obtener la evolución de costos"));
}

#[tokio::test]
async fn test_national_average_only_unfiltered() {
    let rows = || {
        set(vec![
            Row::new()
                .with("Region", "Maule")
                .with("PromedioSatisfaccion", 4.0)
                .with("TotalJardines", 10),
            Row::new()
                .with("Region", "Biobío")
                .with("PromedioSatisfaccion", 5.0)
                .with("TotalJardines", 10),
        ])
    };

    let (app, _) = production(ScriptedInvoker::returning(vec![rows()]));
    let (status, body) = get(app, "/api/educacion/satisfaccionGeografica?ano=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["summary"], json!({"promedioNacional": 4.5}));
    assert_eq!(
        body["data"][0],
        json!({"region": "Maule", "promedioSatisfaccion": 4.0, "totalJardines": 10})
    );

    let (app, _) = production(ScriptedInvoker::returning(vec![rows()]));
    let (_, body) = get(
        app,
        "/api/educacion/satisfaccionGeografica?ano=2024&codigoRegion=7",
    )
    .await;
    assert_eq!(body["summary"], Value::Null);
    assert!(body.as_object().unwrap().contains_key("summary"));
}

#[tokio::test]
async fn test_foreign_nationality_summary() {
    let rows = set(vec![
        Row::new()
            .with("NacionalidadPO", "Venezolana")
            .with("TotalPorNacionalidad", 5)
            .with("Porcentaje", 6.25)
            .with("TotalGeneral", 80),
        Row::new()
            .with("NacionalidadPO", "Peruana")
            .with("TotalPorNacionalidad", 15)
            .with("Porcentaje", 18.75)
            .with("TotalGeneral", 80),
    ]);
    let (app, _) = production(ScriptedInvoker::returning(vec![rows]));
    let (status, body) = get(
        app,
        "/api/dpgr/porcentajeNacionalidadExtranjera?ano=2024",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["resumen"],
        json!({"totalGeneral": 80, "totalExtranjeros": 20, "porcentajeExtranjeros": "25.00"})
    );
    assert_eq!(
        body["params"],
        json!({"ano": 2024, "codigoRegion": null, "codigoJardin": null})
    );
}

#[tokio::test]
async fn test_budget_body_binding() {
    let rows = set(vec![Row::new().with("Monto", 1500)]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![rows]));
    let (status, body) = post(
        app,
        "/api/presupuesto/obtenerPresupuestoVsGastos",
        r#"{"Ano": 2024, "Rubro": "Personal"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));

    let call = &invoker.calls()[0];
    let names: Vec<&str> = call.params.iter().map(|p| p.name).collect();
    assert_eq!(names, ["Ano", "NombreDireccion", "Rubro", "SubRubro"]);
    assert_eq!(call.params[0].value, SqlValue::Int(Some(2024)));
    assert!(call.params[1].value.is_null());
}

#[tokio::test]
async fn test_budget_requires_year() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = post(app, "/api/presupuesto/obtenerFlujoSaldo", "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("El parámetro \"Ano\" es obligatorio."));
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = post(app, "/api/presupuesto/obtenerFlujoSaldo", "{\"Ano\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("El cuerpo de la petición debe ser un objeto JSON válido")
    );
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let (app, _) = production(ScriptedInvoker::new());
    let request = Request::get("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn test_ready_with_scripted_invoker() {
    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["database"], json!("ready"));
}

#[tokio::test]
async fn test_wrong_method_is_not_found_envelope() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/login").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Ruta no encontrada: GET /api/login"));

    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = post(app, "/api/dppi/conteoJardines", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        json!("Ruta no encontrada: POST /api/dppi/conteoJardines")
    );
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_json_envelope() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let padding = "x".repeat(2 * 1024 * 1024);
    let body = format!(r#"{{"Ano": 2024, "Relleno": "{padding}"}}"#);
    let (status, body) = post(app, "/api/presupuesto/obtenerGastosVsSaldo", &body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["message"],
        json!("El cuerpo de la petición supera el tamaño máximo permitido")
    );
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_satisfaction_params_echo_order() {
    let rows = set(vec![
        Row::new()
            .with("Region", "Maule")
            .with("PromedioSatisfaccion", 4.0)
            .with("TotalJardines", 10),
    ]);
    let (app, _) = production(ScriptedInvoker::returning(vec![rows]));
    let (_, body) = get(
        app,
        "/api/educacion/satisfaccionGeografica?codigoRegion=7&ano=2024",
    )
    .await;

    let keys: Vec<&String> = body["params"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["ano", "codigoRegion"]);
    assert_eq!(body["params"], json!({"ano": 2024, "codigoRegion": 7}));
}

#[tokio::test]
async fn test_staff_indicators_share_one_message() {
    let invalid = json!("Los parámetros proporcionados no son válidos");

    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/persona/compararIndicadores?AnoActual=2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], invalid);
    assert_eq!(invoker.call_count(), 0);

    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = get(
        app,
        "/api/persona/tendenciaIndicadores?Ano=abc&CodigoRegionPersona=3",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], invalid);
    assert_eq!(invoker.call_count(), 0);

    let (app, _) = production(ScriptedInvoker::new());
    let (status, body) = get(app, "/api/persona/indicadoresRegion?Mes=marzo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], invalid);
}

#[tokio::test]
async fn test_staff_region_is_lenient() {
    let rows = set(vec![Row::new().with("Indicador", "Dotación").with("Valor", 93)]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![rows]));
    let (status, body) = get(
        app,
        "/api/persona/objetivoVsActual?Ano=2024&CodigoRegionPersona=norte",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["Valor"], json!(93));

    let call = &invoker.calls()[0];
    assert_eq!(call.params[0].value, SqlValue::Int(Some(2024)));
    assert_eq!(call.params[1].name, "CodigoRegionPersona");
    assert!(call.params[1].value.is_null());
}

#[tokio::test]
async fn test_direction_filters_are_typed() {
    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = post(
        app,
        "/api/parametros/obtenerDirecciones",
        r#"{"CodigoDireccion": "5"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("El parámetro \"CodigoDireccion\" debe ser un número.")
    );
    assert_eq!(invoker.call_count(), 0);

    let (app, invoker) = production(ScriptedInvoker::new());
    let (status, body) = post(
        app,
        "/api/parametros/obtenerDirecciones",
        r#"{"TipoDireccion": 5}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("El parámetro \"TipoDireccion\" debe ser un texto.")
    );
    assert_eq!(invoker.call_count(), 0);

    let rows = set(vec![Row::new().with("CodigoDireccion", 5).with("Nombre", "DR Maule")]);
    let (app, invoker) = production(ScriptedInvoker::returning(vec![rows]));
    let (status, body) = post(
        app,
        "/api/parametros/obtenerDirecciones",
        r#"{"CodigoDireccion": 5, "TipoDireccion": "Regional"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(invoker.calls()[0].params[0].value, SqlValue::Int(Some(5)));
}

#[tokio::test]
async fn test_accidents_fill_two_slots() {
    let detalle = set(vec![
        Row::new().with("TipoAccidente", "Caída").with("Total", 4),
        Row::new().with("TipoAccidente", "Golpe").with("Total", 2),
    ]);
    let resumen = set(vec![Row::new().with("TotalAccidentes", 6)]);
    let (app, _) = production(ScriptedInvoker::returning(vec![detalle.clone(), resumen]));
    let (status, body) = get(app, "/api/dpgr/totalAccidentes?ano=2024&codigoRegion=7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["detalleAccidentes"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["resumen"], json!({"TotalAccidentes": 6}));
    assert_eq!(
        body["params"],
        json!({"ano": 2024, "codigoRegion": 7, "codigoJardin": null})
    );

    // A summary set with no rows keeps its slot.
    let (app, _) = production(ScriptedInvoker::returning(vec![detalle, set(vec![])]));
    let (status, body) = get(app, "/api/dpgr/totalAccidentes?ano=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resumen"], Value::Null);
}

#[tokio::test]
async fn test_nationality_grouped_by_commune() {
    let row = |comuna: &str, nacionalidad: &str, total: i64| {
        Row::new()
            .with("Comuna", comuna)
            .with("NombreRegion", "Maule")
            .with("DireccionRegional", "DR Maule")
            .with("NacionalidadPO", nacionalidad)
            .with("Total", total)
    };
    let rows = set(vec![
        row("Talca", "Venezolana", 3),
        row("Talca", "Haitiana", 2),
        row("Linares", "Peruana", 1),
    ]);
    let invoker = ScriptedInvoker::new()
        .with_procedure("sp_ObtenerNacionalidadPorGeografia", vec![rows])
        .with_failure(
            "sp_ObtenerTotalAccidentes",
            InvokeError::Failed("deadlock victim".into()),
        );
    let (app, invoker) = production(invoker);

    let (status, body) = get(app.clone(), "/api/dpgr/nacionalidadPorGeografia?ano=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "Talca": {
                "nombreRegion": "Maule",
                "direccionRegional": "DR Maule",
                "nacionalidades": {"Venezolana": 3, "Haitiana": 2}
            },
            "Linares": {
                "nombreRegion": "Maule",
                "direccionRegional": "DR Maule",
                "nacionalidades": {"Peruana": 1}
            }
        })
    );

    let (status, body) = get(app, "/api/dpgr/totalAccidentes?ano=2024").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!(DB_ERROR));
    assert_eq!(invoker.call_count(), 2);
}
