//! `POST /api/login`: identity check against the user directory.
//!
//! The procedure reports a wrong key or an unknown user through the
//! `Mensaje` column of an otherwise normal row.

use super::{ApiRouter, Catalog};
use sgi::{Guard, ParamSpec, Rejection, Route};

const OBLIGATORIOS: &str = "Los parámetros \"CorreoElectronico\" y \"RUT\" son obligatorios.";
const USUARIO_NO_ENCONTRADO: &str = "Usuario no encontrado";

pub fn route() -> Route {
    Route::new("/api/login", "sp_ObtenerDatosUsuario")
        .params([
            ParamSpec::text("CorreoElectronico", "CorreoElectronico", 100)
                .required(OBLIGATORIOS)
                .strict("El parámetro \"CorreoElectronico\" debe ser un texto."),
            ParamSpec::bigint("RUT", "RUT")
                .required(OBLIGATORIOS)
                .numbers_only()
                .strict("El parámetro \"RUT\" debe ser un número."),
        ])
        .not_found(USUARIO_NO_ENCONTRADO)
        .guard(
            Guard::on("Mensaje")
                .reject("Clave incorrecta", Rejection::Unauthorized("Clave incorrecta"))
                .reject(
                    USUARIO_NO_ENCONTRADO,
                    Rejection::NotFound(USUARIO_NO_ENCONTRADO),
                ),
        )
}

pub fn router() -> ApiRouter {
    ApiRouter::new().post_route(route())
}
