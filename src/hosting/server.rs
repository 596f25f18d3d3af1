use super::saloon::Saloon;
use crate::ID;
use crate::gameroom::GameError;
use crate::gameroom::ServerMessage;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;

/// HTTP/WebSocket gateway in front of the saloon.
///
/// Room creation is a plain request/response call; everything else rides the
/// per-participant WebSocket addressed by room id in the path.
pub struct Server;

impl Server {
    pub async fn run(bind: &str) -> Result<(), std::io::Error> {
        let saloon = web::Data::new(Saloon::default());
        log::info!("starting hosting server on {}", bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(saloon.clone())
                .route("/health", web::get().to(health))
                .route("/create-room", web::post().to(create))
                .route("/{room_id}", web::get().to(enter))
        })
        .workers(4)
        .bind(bind)?
        .run()
        .await
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

async fn create(saloon: web::Data<Saloon>) -> impl Responder {
    let id = saloon.into_inner().open().await;
    HttpResponse::Ok().json(serde_json::json!({ "roomId": id.to_string() }))
}

/// Upgrades to WebSocket and attaches the connection to its room.
/// Transport-level refusals (unknown room, full room) are delivered as one
/// `error` frame over the fresh socket, which is then closed; there is no
/// queueing and no retry protocol.
async fn enter(
    saloon: web::Data<Saloon>,
    path: web::Path<String>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let room = path.into_inner();
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let verdict = match room.parse::<uuid::Uuid>() {
                Ok(uuid) => saloon.bridge(ID::from(uuid), session.clone(), stream).await,
                Err(_) => Err(GameError::RoomNotFound),
            };
            if let Err(refusal) = verdict {
                log::info!("[gateway] refusing connection to {:?}: {}", room, refusal);
                actix_web::rt::spawn(async move {
                    let mut session = session;
                    let _ = session
                        .text(ServerMessage::error(&refusal).to_json())
                        .await;
                    let _ = session.close(None).await;
                });
            }
            response
        }
        Err(e) => HttpResponse::from_error(e),
    }
}
