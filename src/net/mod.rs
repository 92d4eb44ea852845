//! HTTP clients for the three external endpoints.
//!
//! * [`Captioner`] / [`HttpCaptioner`] — uploads an encoded image to the
//!   configured captioning backend and extracts the caption.
//! * [`Translator`] / [`MyMemoryTranslator`] — translates the caption via the
//!   public MyMemory API; failures are non-fatal to the pipeline.
//! * [`ConnectivityProbe`] — bounded-timeout reachability check against the
//!   configured backend, driven from the settings screen.
//!
//! Each client is a thin `reqwest` wrapper: single request, no retry, no
//! streaming.  Errors are caught at each client's own boundary and never
//! roll back earlier pipeline steps.

pub mod caption;
pub mod connectivity;
pub mod translate;

pub use caption::{CaptionError, Captioner, HttpCaptioner};
pub use connectivity::{ConnectivityProbe, PROBE_TIMEOUT};
pub use translate::{MyMemoryTranslator, TranslateError, Translator};
