pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, job_service::JobService,
    storage_service::StorageService, user_service::UserService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        let storage = StorageService::new(
            http_client,
            config.cloudinary_api_base.clone(),
            config.cloudinary_cloud_name.clone(),
            config.cloudinary_api_key.clone(),
            config.cloudinary_api_secret.clone(),
            config.cloudinary_folder.clone(),
        );

        let user_service = UserService::new(pool.clone());
        let job_service = JobService::new(pool.clone(), storage.clone());
        let application_service = ApplicationService::new(pool.clone(), storage.clone());

        Self {
            pool,
            user_service,
            job_service,
            application_service,
            storage,
        }
    }
}
