use log::info;
use skyforest_geotiff::api::{create_router, ServerConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ServerConfig::from_env();
    let app = create_router(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .expect("Failed to bind port");

    info!("body limit {} bytes", config.body_limit);

    println!("🚀 GeoTIFF Writer API Server");
    println!("📡 Listening on http://{}", config.bind);
    println!();
    println!("📍 Endpoints:");
    println!("  POST /api/geotiff (multipart/form-data: image jpeg + origin_x, origin_y, scale_x, scale_y)");
    println!("  POST /api/geotiff/raw?width=<w>&height=<h>&channels=<n>&data_type=<u8|u16|...>&origin_x=..&origin_y=..&scale_x=..&scale_y=.. (raw pixel body)");
    println!();

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
