use std::sync::Arc;

use axum::extract::FromRef;
use stranger_core::Matchmaker;

use crate::connections::Connections;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub matchmaker: Arc<Matchmaker>,
    pub connections: Arc<Connections>,
}
