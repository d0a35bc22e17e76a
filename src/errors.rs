#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("Invalid item configuration: {0}")]
    InvalidConfig(String),

    #[error("Render window is closed")]
    WindowClosed,
}
