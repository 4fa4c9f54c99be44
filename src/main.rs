use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use friends_api::config::{Config, StorageBackend, TlsConfig};
use friends_api::friend_storage::{FriendStorage, StorageError};
use friends_api::memory_friend_storage::MemoryFriendStorage;
use friends_api::postgres_friend_storage::PostgresFriendStorage;
use friends_api::{api, cors, postgres};

async fn init_storage(backend: &StorageBackend) -> Result<Arc<dyn FriendStorage>, StorageError> {
    match backend {
        StorageBackend::Postgres { database_url, pool_max_size } => {
            let pool = postgres::create_pool(database_url, *pool_max_size)?;
            postgres::migrate_up(&pool).await?;
            log::info!("Connected to postgres");
            Ok(Arc::new(PostgresFriendStorage::new(pool)))
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage, records are lost on restart");
            Ok(Arc::new(MemoryFriendStorage::new()))
        }
    }
}

fn ssl_acceptor(tls: &TlsConfig) -> io::Result<SslAcceptorBuilder> {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;
    builder.set_private_key_file(&tls.key_file, SslFiletype::PEM)?;
    builder.set_certificate_chain_file(&tls.cert_file)?;
    Ok(builder)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    let storage = init_storage(&config.storage)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    let storage: web::Data<dyn FriendStorage> = web::Data::from(storage);

    let frontend_url = config.frontend_url.clone();
    let http_server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(cors::layer(frontend_url.as_deref()))
            .wrap(middleware::Logger::default())
            .app_data(storage.clone())
            .configure(api::configure_routes)
    });

    let http_server = match &config.tls {
        Some(tls) => http_server.bind_openssl(config.address, ssl_acceptor(tls)?)?,
        None => http_server.bind(config.address)?,
    };

    log::info!("Listening on {}...", config.address);
    http_server.run().await
}
