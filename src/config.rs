use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "student-registry")]
#[command(version, about = "REST API for student records", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "STUDENT_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// PostgreSQL connection string; records are kept in memory when absent
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections
    #[arg(long, env = "STUDENT_DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// The single origin allowed to make cross-origin requests
    #[arg(long, env = "STUDENT_ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,
}
