//! Error types for the policyscan-core library.

use thiserror::Error;

/// Main error type for the policyscan library.
#[derive(Error, Debug)]
pub enum PolicyscanError {
    /// The input document cannot be processed at all.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Strategy table error.
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop a document before the pipeline starts.
#[derive(Error, Debug)]
pub enum InputError {
    /// File extension is not one we know how to read.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Company override does not name a known insurer.
    #[error("unknown company: {0}")]
    UnknownCompany(String),

    /// The document bytes could not be decoded.
    #[error("could not read document: {0}")]
    Unreadable(String),

    /// Image input was given but no text recognizer is configured.
    #[error("no OCR engine configured for image input")]
    OcrUnavailable,

    /// Nothing to extract from.
    #[error("document contains no text or images")]
    EmptyDocument,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract page images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Region lies outside the image or is degenerate.
    #[error("invalid region: {0}")]
    InvalidRegion(String),
}

/// Errors raised while building strategy tables.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// A pattern failed to compile.
    #[error("invalid pattern for {field}: {reason}")]
    Pattern { field: String, reason: String },

    /// Strategy file names a company we do not know.
    #[error("unknown company in strategy table: {0}")]
    UnknownCompany(String),

    /// Strategy file names a field we do not know.
    #[error("unknown field in strategy table: {0}")]
    UnknownField(String),

    /// Registry was built without a generic entry.
    #[error("registry has no generic strategy")]
    MissingGeneric,

    /// Strategy file could not be decoded.
    #[error("failed to decode strategy file: {0}")]
    Decode(String),
}

/// Result type for the policyscan library.
pub type Result<T> = std::result::Result<T, PolicyscanError>;
