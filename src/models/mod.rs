pub mod event;
pub mod hook;
pub mod memory;

pub use event::{HookEvent, LifecycleEvent};
pub use hook::{CompactTrigger, HookInput, TranscriptReference};
pub use memory::{Envelope, ExtractRequest, FormattedData, MemoryContext};
