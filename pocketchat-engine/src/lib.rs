pub mod attachment;
pub mod bitmap;
pub mod completion;
pub mod session;
pub mod traits;
pub mod voice;
pub mod worker;
