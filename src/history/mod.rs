pub mod air;
pub mod frame;
pub mod legacy;
pub mod session;

pub use frame::{classify, FrameClass};
pub use session::{HistoryProtocol, LogDownload, LogReadRequest, Progress};
