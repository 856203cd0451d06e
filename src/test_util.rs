//! Throw-away upstream servers for tests.

use std::net::TcpListener;
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use url::Url;

/// Starts an upstream on an ephemeral port and returns its base url.
///
/// Every path echoes `"<name> <method> <uri> <body>"` and reports what it saw in
/// `x-upstream`, `x-seen-*` headers. `/slow` answers after half a second and
/// `/missing` answers 404.
pub async fn spawn_upstream(name: &'static str) -> Url {
    let server = HttpServer::new(move || {
        App::new()
            .route("/slow", web::get().to(slow))
            .route("/missing", web::get().to(|| async { HttpResponse::NotFound().finish() }))
            .default_service(web::route().to(move |req: HttpRequest, body: web::Bytes| {
                echo(name, req, body)
            }))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("bind upstream");

    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    Url::parse(&format!("http://{}", addr)).unwrap()
}

/// A url nothing listens on.
pub fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Url::parse(&format!("http://{}", addr)).unwrap()
}

async fn echo(name: &'static str, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let mut resp = HttpResponse::Ok();
    resp.insert_header(("x-upstream", name));

    for (seen, header) in &[
        ("x-seen-host", "host"),
        ("x-seen-custom", "x-custom"),
        ("x-seen-forwarded-for", "x-forwarded-for"),
    ] {
        if let Some(value) = req.headers().get(*header) {
            resp.insert_header((*seen, value.clone()));
        }
    }

    resp.body(format!(
        "{} {} {} {}",
        name,
        req.method(),
        req.uri(),
        String::from_utf8_lossy(&body)
    ))
}

async fn slow() -> HttpResponse {
    actix_rt::time::sleep(Duration::from_millis(500)).await;
    HttpResponse::Ok().body("late")
}
