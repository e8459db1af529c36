//! Provider models and the request values built from them.

use crate::bbox::{BoundingBox, Coordinates};
use crate::error::{GribError, GribResult};
use crate::template::UrlTemplate;
use crate::zone::ZoneRegistry;

/// Query arguments sent when a provider does not override them.
pub const DEFAULT_ARGS: &str = "wgtprn";

/// Zone label used in file names when raw coordinates were given.
pub const CUSTOM_ZONE: &str = "custom";

/// A weather-data provider/model and its current selection.
///
/// Not safe to share between concurrent downloads: selecting a zone needs
/// `&mut self`, so callers serialize `set_zone` and the download that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderModel {
    name: String,
    url_template: String,
    args: String,
    bbox: Option<BoundingBox>,
    zone: Option<String>,
    api_url: Option<String>,
}

impl ProviderModel {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            args: DEFAULT_ARGS.to_string(),
            bbox: None,
            zone: None,
            api_url: None,
        }
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    /// Check the URL template without rendering it.
    pub fn validate(&self) -> GribResult<()> {
        self.template().map(|_| ())
    }

    fn template(&self) -> GribResult<UrlTemplate> {
        UrlTemplate::parse(&self.url_template).map_err(|source| GribError::Template {
            model: self.name.clone(),
            source,
        })
    }

    /// Render the request URL for `bbox` without touching the model.
    pub fn render_url(&self, bbox: &BoundingBox) -> GribResult<String> {
        Ok(self.template()?.render(bbox, &self.args))
    }

    /// Select a registered zone. See [`ZoneRegistry::resolve`].
    pub fn set_zone(
        &mut self,
        registry: &ZoneRegistry,
        zone_id: &str,
    ) -> GribResult<(BoundingBox, String)> {
        registry.resolve(self, zone_id)
    }

    /// Select raw coordinates; clears any zone. Returns the rendered URL.
    pub fn set_coordinates(&mut self, bbox: BoundingBox) -> GribResult<String> {
        let url = self.render_url(&bbox)?;
        self.bbox = Some(bbox);
        self.zone = None;
        self.api_url = Some(url.clone());
        Ok(url)
    }

    pub(crate) fn apply_resolution(&mut self, zone_id: &str, bbox: BoundingBox, url: String) {
        self.bbox = Some(bbox);
        self.zone = Some(zone_id.to_string());
        self.api_url = Some(url);
    }

    /// Build the immutable request for a download.
    ///
    /// Explicit `coordinates` win over the model's selection and must be
    /// complete. Without them the model needs a bounding box and URL from an
    /// earlier `set_zone` or `set_coordinates`.
    pub fn request(&self, coordinates: Option<Coordinates>) -> GribResult<DownloadRequest> {
        let explicit = match coordinates {
            Some(coords) => coords.to_bbox()?,
            None => None,
        };

        if let Some(bbox) = explicit {
            let zone = match (&self.zone, &self.bbox) {
                (Some(zone), Some(current)) if *current == bbox => Some(zone.clone()),
                _ => None,
            };
            return Ok(DownloadRequest {
                model_name: self.name.clone(),
                zone,
                bbox,
                url: self.render_url(&bbox)?,
            });
        }

        match (&self.bbox, &self.api_url) {
            (Some(bbox), Some(url)) if !url.is_empty() => Ok(DownloadRequest {
                model_name: self.name.clone(),
                zone: self.zone.clone(),
                bbox: *bbox,
                url: url.clone(),
            }),
            _ => Err(GribError::MissingCoordinates),
        }
    }
}

/// Everything one download needs, fixed at the time it was built.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub model_name: String,
    pub zone: Option<String>,
    pub bbox: BoundingBox,
    pub url: String,
}

impl DownloadRequest {
    /// Zone identifier, or `custom` for raw coordinates.
    pub fn zone_label(&self) -> &str {
        self.zone.as_deref().unwrap_or(CUSTOM_ZONE)
    }
}
