mod cancel;
mod download;
mod jobs;
mod status;
mod upload;

pub(crate) mod process;

use actix_web::{Scope, web};

pub fn configure_routes() -> Scope {
    web::scope("")
        .route("/upload", web::post().to(upload::process))
        .route("/status/{job_id}", web::get().to(status::process))
        .route("/jobs", web::get().to(jobs::process))
        .route("/cancel/{job_id}", web::post().to(cancel::process))
        .route("/download/{job_id}", web::get().to(download::process))
}
