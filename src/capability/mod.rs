//! Collaborators the crawl pipeline calls through narrow interfaces
//!
//! Extraction, rendering, classification and storage are not part of the
//! crawl engine itself. The orchestrator reaches them through the traits in
//! this module, collected in one [`Capabilities`] table that is built once
//! and shared by every worker. Unset optional collaborators simply skip their
//! pipeline step.

mod defaults;

pub use defaults::{
    HeuristicSoft404Detector, HtmlTextExtractor, PathTrapDetector, StructuredDataExtractor,
    TagBoilerplateRemover,
};

use crate::config::{CrawlConfig, FeatureFlags};
use crate::crawler::FetchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Content family a fetched document is routed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    Html,
    Pdf,
    Office,
    Image,
    Video,
    Audio,
    Archive,
    Structured,
    Other,
}

impl ContentClass {
    /// Classifies by content type, falling back to the URL suffix
    ///
    /// # Examples
    ///
    /// ```
    /// use deep_harvest::ContentClass;
    ///
    /// assert_eq!(ContentClass::classify(Some("text/html; charset=utf-8"), "https://a.com/"), ContentClass::Html);
    /// assert_eq!(ContentClass::classify(None, "https://a.com/dump.tar.gz"), ContentClass::Archive);
    /// assert_eq!(ContentClass::classify(Some("application/octet-stream"), "https://a.com/x.pdf"), ContentClass::Pdf);
    /// ```
    pub fn classify(content_type: Option<&str>, url: &str) -> Self {
        let ct = content_type.unwrap_or_default().to_lowercase();
        let path = Url::parse(url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| url.to_lowercase());

        if ct.contains("text/html") || ct.contains("application/xhtml") {
            Self::Html
        } else if ct.contains("application/pdf") {
            Self::Pdf
        } else if ["officedocument", "msword", "ms-excel", "ms-powerpoint"]
            .iter()
            .any(|office| ct.contains(office))
        {
            Self::Office
        } else if ct.starts_with("image/") {
            Self::Image
        } else if ct.starts_with("video/") {
            Self::Video
        } else if ct.starts_with("audio/") {
            Self::Audio
        } else if ct.contains("application/zip")
            || ct.contains("application/x-tar")
            || ct.contains("application/epub+zip")
            || [".zip", ".tar", ".tar.gz", ".tgz", ".epub"]
                .iter()
                .any(|suffix| path.ends_with(suffix))
        {
            Self::Archive
        } else if path.ends_with(".pdf") {
            Self::Pdf
        } else if ct.contains("json") || ct.contains("xml") {
            Self::Structured
        } else {
            Self::Other
        }
    }

    /// Whether the feature flags allow extracting this class
    ///
    /// Image metadata is always extracted; `extract-images` only gates the
    /// OCR pass, see [`ContentClass::wants_ocr`].
    pub fn is_enabled(self, features: &FeatureFlags) -> bool {
        match self {
            Self::Html => features.extract_text,
            Self::Pdf => features.extract_pdfs,
            Self::Office => features.extract_office,
            Self::Image => true,
            Self::Video => features.extract_videos,
            Self::Audio => features.extract_audio,
            Self::Archive | Self::Structured | Self::Other => true,
        }
    }

    pub fn wants_ocr(self, features: &FeatureFlags) -> bool {
        self == Self::Image && features.extract_images
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Office => "office",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Structured => "structured",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Turns a fetched document into structured content
pub trait Extractor: Send + Sync {
    fn extract(&self, page: &FetchResult) -> crate::Result<serde_json::Value>;
}

/// Produces the post-JavaScript version of a page
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, page: FetchResult, wait: Duration)
        -> crate::Result<FetchResult>;

    /// Releases engine resources
    async fn close(&self) {}
}

/// Flags URLs that lead into infinite or useless URL spaces
pub trait TrapDetector: Send + Sync {
    fn is_trap(&self, url: &Url, page: &FetchResult) -> bool;
}

/// Flags error pages served with a success status
pub trait Soft404Detector: Send + Sync {
    fn is_soft_404(&self, page: &FetchResult) -> bool;
}

/// Scores how worth visiting a URL is, in [0, 1]
pub trait ImportanceModel: Send + Sync {
    fn score(&self, url: &Url) -> f64;
}

/// Reduces an HTML page to its main content text
pub trait BoilerplateRemover: Send + Sync {
    fn main_content(&self, html: &str) -> String;
}

/// Everything the pipeline persists for one URL
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub url: String,
    pub final_url: String,
    pub depth: u32,
    pub status: u16,
    pub content_type: Option<String>,
    pub class: ContentClass,
    pub content: serde_json::Value,
    pub structured: serde_json::Value,
    pub size_bytes: usize,
}

/// Persists pipeline results; writes must be idempotent per URL
pub trait Store: Send + Sync {
    fn store(&self, document: &StoredDocument) -> crate::Result<()>;
}

/// The collaborator table shared by all workers
#[derive(Clone)]
pub struct Capabilities {
    extractors: HashMap<ContentClass, Arc<dyn Extractor>>,
    structured: Arc<dyn Extractor>,
    ocr: Option<Arc<dyn Extractor>>,
    renderer: Option<Arc<dyn Renderer>>,
    trap_detector: Option<Arc<dyn TrapDetector>>,
    soft404_detector: Option<Arc<dyn Soft404Detector>>,
    importance_model: Option<Arc<dyn ImportanceModel>>,
    boilerplate_remover: Option<Arc<dyn BoilerplateRemover>>,
    store: Arc<dyn Store>,
}

impl Capabilities {
    /// A table with only a store and the structured-data pass
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            extractors: HashMap::new(),
            structured: Arc::new(StructuredDataExtractor),
            ocr: None,
            renderer: None,
            trap_detector: None,
            soft404_detector: None,
            importance_model: None,
            boilerplate_remover: None,
            store,
        }
    }

    /// Default collaborators enabled by the configured feature flags
    ///
    /// No renderer and no importance model are installed; those are engines
    /// and models supplied by the embedding application.
    pub fn standard(config: &CrawlConfig, store: Arc<dyn Store>) -> Self {
        let features = &config.features;
        let mut caps = Self::new(store);

        if features.extract_text {
            caps = caps.with_extractor(ContentClass::Html, Arc::new(HtmlTextExtractor));
        }
        if features.enable_trap_detection {
            caps = caps.with_trap_detector(Arc::new(PathTrapDetector::default()));
        }
        if features.enable_soft404_detection {
            caps = caps.with_soft404_detector(Arc::new(HeuristicSoft404Detector));
        }
        if features.enable_ml_extraction {
            caps = caps.with_boilerplate_remover(Arc::new(TagBoilerplateRemover));
        }

        caps
    }

    pub fn with_extractor(mut self, class: ContentClass, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(class, extractor);
        self
    }

    pub fn with_structured_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.structured = extractor;
        self
    }

    /// Text recognition pass run on images in addition to the image extractor
    pub fn with_ocr(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.ocr = Some(extractor);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_trap_detector(mut self, detector: Arc<dyn TrapDetector>) -> Self {
        self.trap_detector = Some(detector);
        self
    }

    pub fn with_soft404_detector(mut self, detector: Arc<dyn Soft404Detector>) -> Self {
        self.soft404_detector = Some(detector);
        self
    }

    pub fn with_importance_model(mut self, model: Arc<dyn ImportanceModel>) -> Self {
        self.importance_model = Some(model);
        self
    }

    pub fn with_boilerplate_remover(mut self, remover: Arc<dyn BoilerplateRemover>) -> Self {
        self.boilerplate_remover = Some(remover);
        self
    }

    pub fn extractor(&self, class: ContentClass) -> Option<&Arc<dyn Extractor>> {
        self.extractors.get(&class)
    }

    pub fn structured(&self) -> &Arc<dyn Extractor> {
        &self.structured
    }

    pub fn ocr(&self) -> Option<&Arc<dyn Extractor>> {
        self.ocr.as_ref()
    }

    pub fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    pub fn trap_detector(&self) -> Option<&Arc<dyn TrapDetector>> {
        self.trap_detector.as_ref()
    }

    pub fn soft404_detector(&self) -> Option<&Arc<dyn Soft404Detector>> {
        self.soft404_detector.as_ref()
    }

    pub fn importance_model(&self) -> Option<&Arc<dyn ImportanceModel>> {
        self.importance_model.as_ref()
    }

    pub fn boilerplate_remover(&self) -> Option<&Arc<dyn BoilerplateRemover>> {
        self.boilerplate_remover.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<String> = self.extractors.keys().map(|c| c.to_string()).collect();
        classes.sort();
        f.debug_struct("Capabilities")
            .field("extractors", &classes)
            .field("ocr", &self.ocr.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("trap_detector", &self.trap_detector.is_some())
            .field("soft404_detector", &self.soft404_detector.is_some())
            .field("importance_model", &self.importance_model.is_some())
            .field("boilerplate_remover", &self.boilerplate_remover.is_some())
            .finish()
    }
}
