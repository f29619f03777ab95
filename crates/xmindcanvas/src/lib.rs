#![forbid(unsafe_code)]

//! Converts XMind mind-map documents into JSON Canvas documents.
//!
//! The pipeline is three sequential stages:
//! 1. parse the archive into a [`Workbook`] (sheets of topic trees + images)
//! 2. flatten the first sheet into a sized layout graph and submit it to a
//!    [`LayoutEngine`]
//! 3. materialize the positioned graph into a [`CanvasDocument`]
//!
//! Each conversion is a single synchronous pass with no shared state;
//! independent conversions may run on separate threads. Any stage failure
//! aborts the whole pipeline, and no partial canvas is returned.

pub use xmindcanvas_core::{
    Error as ParseError, ImageResource, Sheet, TopicImage, TopicNode, Workbook, WorkbookParser,
};
pub use xmindcanvas_render::{
    CanvasDocument, CanvasEdge, CanvasMaterializer, CanvasNode, CanvasNodeType, ConversionOptions,
    Direction, Error as RenderError, LayoutEngine, LayoutGraph, PositionedGraph, Side,
    TreeLayoutEngine, calculate_layout, flatten_topic_tree,
};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] xmindcanvas_core::Error),
    #[error(transparent)]
    Render(#[from] xmindcanvas_render::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// A completed conversion: the canvas plus the workbook it came from, so the
/// caller can persist the extracted image binaries alongside the document.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub canvas: CanvasDocument,
    pub workbook: Workbook,
}

/// One-step conversion using the built-in layout engine and the default
/// materializer.
pub fn convert_xmind_to_canvas(bytes: &[u8], options: &ConversionOptions) -> Result<Conversion> {
    convert_xmind_to_canvas_with(bytes, options, &TreeLayoutEngine, &CanvasMaterializer::new())
}

/// Full-control variant: bring your own engine and materializer.
pub fn convert_xmind_to_canvas_with(
    bytes: &[u8],
    options: &ConversionOptions,
    engine: &dyn LayoutEngine,
    materializer: &CanvasMaterializer,
) -> Result<Conversion> {
    let workbook = WorkbookParser::new().parse(bytes)?;
    let positioned = calculate_layout(&workbook, options, engine)?;
    let canvas = materializer.materialize(&positioned);
    Ok(Conversion { canvas, workbook })
}
