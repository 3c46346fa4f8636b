use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{default_route, watcher_route},
    services::WatcherSwitch,
};

pub fn run(listener: TcpListener, switch: WatcherSwitch) -> Result<Server, std::io::Error> {
    let switch = web::Data::new(switch);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/watcher")
                    .service(watcher_route::status)
                    .service(watcher_route::enable)
                    .service(watcher_route::disable),
            )
            .app_data(switch.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
