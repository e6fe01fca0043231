//! Test helpers: fake upstreams and a proxy on ephemeral ports

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use chat_relay_core::config::{ProxyConfig, UiConfig};
use chat_relay_core::proxy::ProxyServer;
use chat_relay_core::TargetStore;

pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub struct RunningProxy {
    pub url: String,
    pub target: TargetStore,
}

pub async fn start_proxy(initial_target: &str) -> RunningProxy {
    let target = TargetStore::new(initial_target);
    let server = ProxyServer::new(
        "127.0.0.1".to_string(),
        0,
        target.clone(),
        &ProxyConfig::default(),
        &UiConfig::default(),
    )
    .unwrap();
    let addr = serve(server.router()).await;
    RunningProxy {
        url: format!("http://{}", addr),
        target,
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream that records every request and answers with a fixed status and JSON body
#[derive(Clone)]
pub struct FakeUpstream {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeUpstream {
    pub async fn start(status: StatusCode, body: Value) -> Self {
        Self::start_with(move |_| (status, Json(body.clone())).into_response()).await
    }

    pub async fn start_with<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> Response + Send + Sync + 'static,
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = (seen.clone(), Arc::new(respond));

        async fn handler<F>(
            State((seen, respond)): State<(Arc<Mutex<Vec<Recorded>>>, Arc<F>)>,
            method: Method,
            uri: Uri,
            headers: HeaderMap,
            body: Bytes,
        ) -> Response
        where
            F: Fn(&Recorded) -> Response + Send + Sync + 'static,
        {
            let recorded = Recorded {
                method,
                path: uri.path().to_string(),
                query: uri.query().map(str::to_string),
                headers,
                body,
            };
            let response = respond(&recorded);
            seen.lock().unwrap().push(recorded);
            response
        }

        let app = Router::new()
            .fallback(handler::<F>)
            .with_state(state);
        let addr = serve(app).await;
        Self { addr, seen }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> Recorded {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}
