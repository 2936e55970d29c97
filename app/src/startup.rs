use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web::Data, App, HttpServer};
use pagesight_pipeline::Pipeline;

use crate::routes;

/// Start serving the API on `listener`.
///
/// Every request runs through the shared `pipeline`, which opens its own
/// browser session per query.
pub fn run(listener: TcpListener, pipeline: Pipeline) -> Result<Server, std::io::Error> {
    let pipeline = Data::new(pipeline);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(routes::configure)
            .app_data(pipeline.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
