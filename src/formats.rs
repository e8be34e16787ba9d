// Supported document formats and their extraction families

/// Every upload format the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Png,
    Jpeg,
    Heic,
    Docx,
    Xlsx,
    Csv,
}

/// Groups formats that share one extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    Pdf,
    Image,
    WordDocument,
    Spreadsheet,
    Csv,
}

/// How image bytes have to be prepared before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageContainer {
    /// HEIF container, decoded and re-encoded before OCR
    Heif,
    /// Formats the OCR engine reads directly
    Direct,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 7] = [
        DocumentFormat::Pdf,
        DocumentFormat::Png,
        DocumentFormat::Jpeg,
        DocumentFormat::Heic,
        DocumentFormat::Docx,
        DocumentFormat::Xlsx,
        DocumentFormat::Csv,
    ];

    /// Normalize a bare extension (no dot), case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "png" => Some(DocumentFormat::Png),
            "jpg" | "jpeg" => Some(DocumentFormat::Jpeg),
            "heic" => Some(DocumentFormat::Heic),
            "docx" => Some(DocumentFormat::Docx),
            "xlsx" => Some(DocumentFormat::Xlsx),
            "csv" => Some(DocumentFormat::Csv),
            _ => None,
        }
    }

    /// The extension is whatever follows the last `.`; names without one have none.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn family(self) -> FormatFamily {
        match self {
            DocumentFormat::Pdf => FormatFamily::Pdf,
            DocumentFormat::Png | DocumentFormat::Jpeg | DocumentFormat::Heic => FormatFamily::Image,
            DocumentFormat::Docx => FormatFamily::WordDocument,
            DocumentFormat::Xlsx => FormatFamily::Spreadsheet,
            DocumentFormat::Csv => FormatFamily::Csv,
        }
    }

    pub fn image_container(self) -> Option<ImageContainer> {
        match self {
            DocumentFormat::Heic => Some(ImageContainer::Heif),
            DocumentFormat::Png | DocumentFormat::Jpeg => Some(ImageContainer::Direct),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Png => write!(f, "png"),
            DocumentFormat::Jpeg => write!(f, "jpeg"),
            DocumentFormat::Heic => write!(f, "heic"),
            DocumentFormat::Docx => write!(f, "docx"),
            DocumentFormat::Xlsx => write!(f, "xlsx"),
            DocumentFormat::Csv => write!(f, "csv"),
        }
    }
}
