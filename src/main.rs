use std::process;

use actix_web::{middleware, web, App, HttpServer};
use awc::Client;
use log::info;
use structopt::StructOpt;

use wlb::backend::Backend;
use wlb::config::Configs;
use wlb::dispatch::dispatch;
use wlb::error::Result;
use wlb::pool::Pool;

#[derive(StructOpt, Debug)]
#[structopt(name = "wlb", about = "Weighted round-robin HTTP load balancer")]
struct Args {
    #[structopt(short = "c", long = "config", default_value = "config.json")]
    config: String,

    /// Overrides load_balancer.port from the config file
    #[structopt(short = "p", long = "port")]
    port: Option<u16>,
}

fn load(path: &str) -> Result<(Configs, Pool)> {
    let configs = Configs::load(path)?;
    let pool = configs.build_pool()?;
    Ok((configs, pool))
}

#[actix_rt::main]
pub async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::from_args();

    let (configs, pool) = match load(&args.config) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    let proxy_addr = configs.load_balancer.host;
    let proxy_port = args.port.unwrap_or(configs.load_balancer.port);
    let max_body_bytes = configs.max_body_bytes;

    for backend in pool.backends() {
        info!("backend {} (weight {})", backend.address(), backend.weight());
    }
    info!("run proxy on {}:{}", proxy_addr, proxy_port);

    let pool = web::Data::new(pool);
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(web::Data::new(Client::default()))
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .wrap(middleware::Logger::default())
            .default_service(web::route().to(dispatch))
    })
    .bind((proxy_addr.as_str(), proxy_port))?
    .run()
    .await
}
