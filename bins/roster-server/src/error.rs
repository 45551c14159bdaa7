use roster_api::PersistenceError;
use roster_api_server::ApiServerError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("store ({kind}): {0}", kind = .0.kind())]
    Store(#[from] PersistenceError),

    #[error("{0}")]
    Api(#[from] ApiServerError),

    #[error("api task: {0}")]
    Task(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
