use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::patching::RequestError;

#[derive(Debug, Clone)]
pub enum ParamType {
    String,
    Array,
}

#[derive(Clone)]
pub struct Param {
    pub name: &'static str,
    pub desc: &'static str,
    pub param_type: ParamType,
    pub required: bool,
}

/// Anything that can be called with a `serde_json::Value` payload.
pub type AsyncFn = Box<
    dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = serde_json::Value> + Send>>
        + Send
        + Sync,
>;

/// Adapt a typed async handler to a uniform `Fn(Value) -> Future<Value>`.
/// Payloads that do not deserialize into `Args` never reach the handler; they
/// come back as a `malformed` request error object.
///
/// ```rust,ignore
/// #[derive(serde::Deserialize)]
/// struct Hello { name: String }
///
/// async fn hello(args: Hello) -> serde_json::Value {
///     serde_json::json!({ "hi": args.name })
/// }
///
/// let wrapped = with_args(hello);
/// let out = wrapped(serde_json::json!({ "name": "Ada" })).await;
/// assert_eq!(out, serde_json::json!({ "hi": "Ada" }));
///
/// let err = wrapped(serde_json::json!({ "name": 123 })).await;
/// assert_eq!(err["code"], "malformed");
/// ```
pub fn with_args<Args, Fut, F>(f: F) -> AsyncFn
where
    Args: serde::de::DeserializeOwned + Send + 'static,
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = serde_json::Value> + Send + 'static,
{
    let f = Arc::new(f);
    Box::new(move |args: serde_json::Value| {
        let args = match serde_json::from_value::<Args>(args) {
            Ok(args) => args,
            Err(e) => {
                let error = RequestError::Malformed(e.to_string()).to_json();
                return Box::pin(async move { error });
            }
        };
        let f = Arc::clone(&f);
        Box::pin(async move { (f)(args).await })
    })
}

/// Run synchronous engine work on tokio's blocking pool so file I/O never
/// stalls a runtime worker. A panicked or cancelled job becomes an error object.
pub async fn off_runtime<F>(what: &'static str, job: F) -> serde_json::Value
where
    F: FnOnce() -> serde_json::Value + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("{what} worker failed: {e}");
            serde_json::json!({ "error": format!("{what} worker failed: {e}"), "code": "internal" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct Hello {
        name: String,
    }

    async fn hello(args: Hello) -> serde_json::Value {
        serde_json::json!({ "hi": args.name })
    }

    #[tokio::test]
    async fn typed_handler_receives_args() {
        let wrapped = with_args(hello);
        let out = wrapped(serde_json::json!({ "name": "Ada" })).await;
        assert_eq!(out, serde_json::json!({ "hi": "Ada" }));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn engine_work_leaves_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let out = off_runtime("echo", move || {
            let same = std::thread::current().id() == runtime_thread;
            serde_json::json!({ "same_thread": same })
        })
        .await;
        assert_eq!(out["same_thread"], false);
    }

    #[tokio::test]
    async fn panicking_job_becomes_an_error_object() {
        let out = off_runtime("preview", || panic!("boom")).await;
        assert_eq!(out["code"], "internal");
        assert!(out["error"].as_str().unwrap().starts_with("preview worker failed"));
    }

    #[tokio::test]
    async fn bad_payload_is_malformed() {
        let wrapped = with_args(hello);
        let err = wrapped(serde_json::json!({ "name": 123 })).await;
        assert_eq!(err["code"], "malformed");
        assert!(err["error"].as_str().unwrap().starts_with("malformed request"));
    }
}
