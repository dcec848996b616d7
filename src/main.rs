use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use dirsnap::config::{Config, TlsPaths};
use dirsnap::{browser_from_config, handlers};
use log::info;
use rustls::ServerConfig;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::env;
use std::fs::File as FsFile;
use std::io::{self, BufReader};

fn load_tls_config(tls: &TlsPaths) -> io::Result<ServerConfig> {
    let cert_file = &mut BufReader::new(FsFile::open(&tls.cert_path)?);
    let key_file = &mut BufReader::new(FsFile::open(&tls.key_path)?);
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>()?;
    let mut keys = pkcs8_private_keys(key_file).collect::<Result<Vec<_>, _>>()?;

    if keys.is_empty() {
        return Err(io::Error::new(io::ErrorKind::Other, "No private keys found in key file"));
    }

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, keys.remove(0).into())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // RUST_LOG overrides the default level, e.g. `RUST_LOG=debug`.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    info!("Serving directory tree rooted at {}", config.root_directory.display());

    let browser = web::Data::new(browser_from_config(&config));
    let addr = config.bind_address();

    let mut http_server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(browser.clone())
            .configure(handlers::configure)
    });

    match &config.tls {
        Some(tls) => {
            info!("Attempting to start HTTPS server...");
            let tls_config = load_tls_config(tls)?;
            info!("Successfully configured TLS. Binding to https://{}", addr);
            http_server = http_server.bind_rustls_0_23(addr, tls_config)?;
        }
        None => {
            info!("No TLS certificate configured. Starting plain HTTP server.");
            info!("Server running at http://{}", addr);
            http_server = http_server.bind(addr)?;
        }
    }

    http_server.run().await
}
