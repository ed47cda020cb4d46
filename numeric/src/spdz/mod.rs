mod engine;
pub use engine::{OpenedValue, SpdzEngine, SpdzMessage};

mod share;
pub use share::SpdzShare;
