#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("host has no document to render into")]
    NotABrowserHost,
    #[error("no element matches mount selector `{0}`")]
    MountPointNotFound(String),
}
