//! Service implementations
//!
//! Real implementations of the service traits. These handle the actual I/O:
//! HTTP calls to the render and upload APIs, checkpoint files and the
//! terminal.

pub mod checkpoint_store;
pub mod console_notifier;
pub mod media_resolver;
pub mod render_client;
pub mod uploader;

#[cfg(test)]
mod tests;

pub use checkpoint_store::FileCheckpointStore;
pub use console_notifier::{ConsoleNotifier, ResumePolicy};
pub use media_resolver::MediaResolver;
pub use render_client::HttpRenderApi;
pub use uploader::HttpAssetUploader;
