//! PDF rendering pipeline: rasterizer, worker thread, and scheduling

pub mod fit;
pub mod rasterizer;
pub mod request;
pub mod scheduler;
pub mod types;
pub mod worker;

pub use fit::{fit_scale, scaled_dimensions};
pub use rasterizer::{MupdfRasterizer, OpenDocument, PageRasterizer};
pub use request::{DocGeneration, RasterFault, RequestId, WorkerRequest, WorkerResponse};
pub use scheduler::{Dispatch, RenderScheduler};
pub use types::{PageBitmap, PageSize, SurfaceSize};
pub use worker::render_worker;
