use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaugeError {
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Invalid color {0:?}: expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    #[error("Style parsing error: {0}")]
    StyleParse(#[from] toml::de::Error),

    #[error("Font data could not be parsed")]
    InvalidFont,

    #[error("Window error: {0}")]
    Window(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, GaugeError>;
