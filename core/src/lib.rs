pub mod config;
pub mod export;
pub mod generate;
pub mod selection;
pub mod session;
pub mod telemetry;

pub use config::{ConfigError, ServiceKind, ServiceSettings};
pub use export::{DownloadService, ExportError, DOWNLOAD_FILENAME};
pub use generate::{GenerateError, GenerationEvent, GenerationPhase, GenerationService};
pub use selection::{SelectedFile, Selection, SelectionError, SUPPORTED_EXTENSIONS};
pub use session::{Document, Session};
