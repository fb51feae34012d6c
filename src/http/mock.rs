//! A scripted in-memory [`Transport`] for driving the client without a
//! network.
//!
//! Routes match on verb and a URL fragment. Each route holds a queue of
//! responses; the last one repeats once the queue is drained. Every request
//! is recorded for later inspection.

use async_lock::Mutex;
use futures_util::future::BoxFuture;

use crate::describe::Verb;
use crate::error::HttpError;
use crate::http::transport::{HttpResponse, Transport};
use crate::sign::HttpRequest;

struct Route {
    verb: Verb,
    fragment: String,
    responses: Vec<HttpResponse>,
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `verb` calls whose URL contains `fragment`. Routes are tried in
    /// the order they were added.
    pub fn route(mut self, verb: Verb, fragment: &str, responses: Vec<HttpResponse>) -> Self {
        self.routes.get_mut().push(Route {
            verb,
            fragment: fragment.to_string(),
            responses,
        });
        self
    }

    /// Shorthand for a route answering `200` with a JSON body.
    pub fn json(self, verb: Verb, fragment: &str, body: serde_json::Value) -> Self {
        self.route(verb, fragment, vec![HttpResponse::new(200, body.to_string())])
    }

    /// Requests seen so far, in arrival order.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn count(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

impl Transport for MockTransport {
    fn execute<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            self.requests.lock().await.push(request.clone());
            let mut routes = self.routes.lock().await;
            let route = routes
                .iter_mut()
                .find(|r| r.verb == request.method && request.url.contains(&r.fragment))
                .ok_or_else(|| HttpError::Transport(format!("no route for {} {}", request.method, request.url)))?;
            match route.responses.len() {
                0 => Err(HttpError::Transport(format!("route {} has no responses", route.fragment))),
                1 => Ok(route.responses[0].clone()),
                _ => Ok(route.responses.remove(0)),
            }
        })
    }
}
