pub mod downloader;
pub mod registry;

pub use downloader::ModelDownloader;
pub use registry::{
    default_check_components, default_components, default_models, Component, ComponentKind,
    ModelSpec,
};
