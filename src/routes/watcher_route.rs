use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::services::{WatcherState, WatcherStats, WatcherSwitch};

#[derive(Serialize)]
struct WatcherStatus {
    state: WatcherState,
    #[serde(flatten)]
    stats: WatcherStats,
}

#[get("/status")]
async fn status(switch: web::Data<WatcherSwitch>) -> HttpResponse {
    HttpResponse::Ok().json(WatcherStatus {
        state: switch.state(),
        stats: switch.stats(),
    })
}

#[post("/enable")]
async fn enable(switch: web::Data<WatcherSwitch>) -> HttpResponse {
    switch.enable();
    HttpResponse::Ok().body("Enabled")
}

#[post("/disable")]
async fn disable(switch: web::Data<WatcherSwitch>) -> HttpResponse {
    switch.disable();
    HttpResponse::Ok().body("Disabled")
}
