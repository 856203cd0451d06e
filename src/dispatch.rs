use actix_web::{web, HttpRequest, HttpResponse};
use awc::Client;
use log::{info, warn};

use crate::error::Result;
use crate::pool::Pool;

/// Single entry point for every inbound request, whatever the method or path.
pub async fn dispatch(
    req: HttpRequest,
    body: web::Bytes,
    pool: web::Data<Pool>,
    client: web::Data<Client>,
) -> Result<HttpResponse> {
    info!("received request {} {}", req.method(), req.uri());

    let picked = pool.pick_backend().map_err(|err| {
        warn!("cannot dispatch {}: {}", req.uri(), err);
        err
    })?;
    info!("forwarding request to {}", picked.address());

    picked.forward(client.get_ref(), &req, body).await
}
