//! 行情中继服务入口

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use quote_relay::config::AppConfig;
use quote_relay::handlers;
use quote_relay::middleware::CorsMiddleware;
use quote_relay::services::QuoteRelay;

/// 应用程序入口
///
/// 启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();
    let relay = QuoteRelay::from_config(&config.upstream).map_err(|e| {
        log::error!("创建上游客户端失败: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let relay = web::Data::new(relay);
    let cors_origin = config.server.cors_origin.clone();

    log::info!("启动行情中继服务，监听 {}", config.bind_addr());

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .wrap(Logger::default())  // 添加请求日志中间件
            .wrap(CorsMiddleware::new(&cors_origin))  // 跨域
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await
}
