pub mod middleware;
pub mod request_id;

pub use middleware::{auth_middleware, pipeline_auth_middleware, AuthUser, PipelineToken};
pub use request_id::{request_id_middleware, RequestId};
