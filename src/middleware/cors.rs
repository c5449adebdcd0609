//! 跨域中间件
//!
//! 为所有响应附加 CORS 头，OPTIONS 预检请求直接返回 200，不进入处理器

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{
            HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        Method,
    },
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

/// 允许的请求头
const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
/// 允许的方法
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// CORS 中间件
pub struct CorsMiddleware {
    origin: Rc<HeaderValue>,
}

impl CorsMiddleware {
    pub fn new(origin: &str) -> Self {
        let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            log::warn!("无效的跨域来源 {:?}，使用 *", origin);
            HeaderValue::from_static("*")
        });
        Self {
            origin: Rc::new(origin),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddlewareService {
            service: Rc::new(service),
            origin: self.origin.clone(),
        })
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    origin: Rc<HeaderValue>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let origin = self.origin.clone();

        Box::pin(async move {
            // 预检请求
            if req.method() == Method::OPTIONS {
                let response = HttpResponse::Ok()
                    .insert_header((ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_ref().clone()))
                    .insert_header((ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                    .insert_header((ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                    .finish();
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_ref().clone());
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            Ok(res.map_into_left_body())
        })
    }
}
