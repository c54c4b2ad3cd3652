use ntex::web::HttpResponse;

pub async fn readiness() -> HttpResponse {
    HttpResponse::Ok().body("ready")
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().body("alive")
}
