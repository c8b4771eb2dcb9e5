use std::sync::Arc;

use mmbridge_core::chat::ChatModel;

pub mod cli;
pub mod commands;

pub struct AppContext {
    pub model: Arc<dyn ChatModel>,
}
