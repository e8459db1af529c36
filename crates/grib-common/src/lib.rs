//! Zone, bounding box and provider types shared by the GRIB download tools.

pub mod bbox;
pub mod error;
pub mod provider;
pub mod template;
pub mod zone;

pub use bbox::{BoundingBox, Coordinates, CoordinatesParseError};
pub use error::{BoxError, GribError, GribResult};
pub use provider::{DownloadRequest, ProviderModel, CUSTOM_ZONE, DEFAULT_ARGS};
pub use template::{TemplateError, UrlTemplate};
pub use zone::{ZoneDefinition, ZoneRegistry};
